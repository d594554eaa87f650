//! fp - formplot server and one-shot pipeline runner

use std::fs;
use std::path::PathBuf;

use clap::Parser;
use eyre::{Context, Result};
use tracing::{debug, info};

use formplot::cli::{Cli, Command, DemoApp};
use formplot::config::Config;
use formplot::dataset::{assemble, assemble_with};
use formplot::fixtures::{bar_contract, bar_fixture, scatter_fixture};
use formplot::pipeline::{Pipeline, PipelineRequest};
use formplot::repository::TemplateRequest;
use formplot::server;

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("formplot")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    // Priority: CLI --log-level > config file > INFO
    let level = match cli_log_level.or(config_log_level) {
        Some(s) => match s.to_uppercase().as_str() {
            "TRACE" => tracing::Level::TRACE,
            "DEBUG" => tracing::Level::DEBUG,
            "INFO" => tracing::Level::INFO,
            "WARN" | "WARNING" => tracing::Level::WARN,
            "ERROR" => tracing::Level::ERROR,
            _ => {
                eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", s);
                tracing::Level::INFO
            }
        },
        None => tracing::Level::INFO,
    };

    let log_file = fs::File::create(log_dir.join("formplot.log")).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {:?})", level);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_log_level = Config::load_log_level(cli.config.as_ref());
    setup_logging(cli.log_level.as_deref(), config_log_level.as_deref()).context("Failed to setup logging")?;

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    config.validate()?;

    debug!(command = ?cli.command, "main: dispatching command");
    match cli.command {
        Command::Serve { bind } => {
            let bind = bind.unwrap_or_else(|| config.server.bind.clone());
            println!("formplot listening on http://{}", bind);
            server::serve(config, &bind).await
        }
        Command::Render {
            object_id,
            plot_template_id,
            visual_template_id,
            client_id,
            client_secret,
        } => {
            cmd_render(
                &config,
                &object_id,
                &plot_template_id,
                &visual_template_id,
                client_id,
                client_secret,
            )
            .await
        }
        Command::Demo { app } => cmd_demo(app),
    }
}

async fn cmd_render(
    config: &Config,
    object_id: &str,
    plot_template_id: &str,
    visual_template_id: &str,
    client_id: String,
    client_secret: String,
) -> Result<()> {
    debug!(%object_id, %plot_template_id, %visual_template_id, "cmd_render: called");
    let pipeline = Pipeline::from_config(config)?;
    let template = TemplateRequest::new(object_id, plot_template_id, visual_template_id)?;
    let request = PipelineRequest::new(template, client_id, client_secret);

    match pipeline.run(&request).await {
        Ok(dataset) => {
            println!("{}", serde_json::to_string_pretty(&dataset)?);
            Ok(())
        }
        Err(e) => Err(eyre::eyre!("{} (status {})", e, e.status_class().code())),
    }
}

fn cmd_demo(app: DemoApp) -> Result<()> {
    debug!(?app, "cmd_demo: called");
    let dataset = match app {
        DemoApp::Scatter => {
            let (schema, rows) = scatter_fixture();
            assemble(schema, rows)?
        }
        DemoApp::Bar => {
            let (schema, rows) = bar_fixture();
            assemble_with(schema, rows, &bar_contract())?
        }
    };
    println!("{}", serde_json::to_string_pretty(&dataset)?);
    Ok(())
}
