//! CLI command definitions and subcommands

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// formplot - template-driven form data visualization
#[derive(Parser)]
#[command(name = "fp", about = "Resolve plot templates, fetch form entries and serve visualizations", version)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(
        short = 'l',
        long = "log-level",
        global = true,
        help = "Log level (TRACE, DEBUG, INFO, WARN, ERROR)"
    )]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Start the HTTP server and visualization worker
    Serve {
        /// Address to bind, overriding server.bind
        #[arg(short, long)]
        bind: Option<String>,
    },

    /// Run the pipeline once and print the dataset as JSON
    Render {
        object_id: String,
        plot_template_id: String,
        visual_template_id: String,

        #[arg(long)]
        client_id: String,

        #[arg(long)]
        client_secret: String,
    },

    /// Print a demo dataset as JSON
    Demo {
        #[arg(value_enum)]
        app: DemoApp,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DemoApp {
    Scatter,
    Bar,
}
