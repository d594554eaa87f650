use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use log::info;

use templatestore::cli::{Cli, Command};
use templatestore::config::Config;
use templatestore::{BatchGet, PlotTemplate, TemplateStore, VisualTemplate};

fn setup_logging() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Warn)
        .init();
    Ok(())
}

fn main() -> Result<()> {
    setup_logging().context("Failed to setup logging")?;

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    let db_path = cli.db.unwrap_or(config.store_path);

    info!("templatestore starting (db: {})", db_path.display());
    let mut store = TemplateStore::open(&db_path).context("Failed to open template store")?;

    match cli.command {
        Command::PutPlot {
            object_id,
            plot_id,
            container_id,
        } => {
            store.put_plot(&PlotTemplate {
                object_id: object_id.clone(),
                plot_id: plot_id.clone(),
                container_id,
            })?;
            println!("{} Stored plot template {}/{}", "✓".green(), object_id, plot_id.cyan());
        }
        Command::PutVisual {
            object_id,
            visual_id,
            plot_template_id,
            container_id,
        } => {
            store.put_visual(&VisualTemplate {
                object_id: object_id.clone(),
                visual_id: visual_id.clone(),
                plot_template_id,
                container_id,
            })?;
            println!("{} Stored visual template {}/{}", "✓".green(), object_id, visual_id.cyan());
        }
        Command::Get {
            object_id,
            plot_id,
            visual_id,
        } => {
            let pair = store.batch_get(&BatchGet::for_object(object_id, plot_id, visual_id))?;
            println!("{}", serde_json::to_string_pretty(&pair)?);
        }
        Command::List { object_id } => {
            let plots = store.list_plots(object_id.as_deref())?;
            let visuals = store.list_visuals(object_id.as_deref())?;
            if plots.is_empty() && visuals.is_empty() {
                println!("No templates found");
            }
            for p in plots {
                println!(
                    "{} {}/{} container={}",
                    "plot".yellow(),
                    p.object_id,
                    p.plot_id.cyan(),
                    p.container_id.dimmed()
                );
            }
            for v in visuals {
                println!(
                    "{} {}/{} plot={} container={}",
                    "visual".yellow(),
                    v.object_id,
                    v.visual_id.cyan(),
                    v.plot_template_id,
                    v.container_id.dimmed()
                );
            }
        }
        Command::DeletePlot { object_id, plot_id } => {
            store.delete_plot(&object_id, &plot_id)?;
            println!("{} Deleted plot template {}/{}", "✓".green(), object_id, plot_id);
        }
        Command::DeleteVisual { object_id, visual_id } => {
            store.delete_visual(&object_id, &visual_id)?;
            println!("{} Deleted visual template {}/{}", "✓".green(), object_id, visual_id);
        }
    }

    Ok(())
}
