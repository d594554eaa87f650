//! CLI argument parsing for templatestore

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "ts")]
#[command(author, version, about = "Plot and visual template store", long_about = None)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Override the database path from config
    #[arg(short, long)]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create or replace a plot template
    PutPlot {
        #[arg(required = true)]
        object_id: String,

        #[arg(required = true)]
        plot_id: String,

        /// Container holding the object's form entries
        #[arg(long, required = true)]
        container_id: String,
    },

    /// Create or replace a visual template
    PutVisual {
        #[arg(required = true)]
        object_id: String,

        #[arg(required = true)]
        visual_id: String,

        /// Plot template this visual renders
        #[arg(long, required = true)]
        plot_template_id: String,

        #[arg(long, required = true)]
        container_id: String,
    },

    /// Batched lookup of a plot and visual template pair
    Get {
        #[arg(required = true)]
        object_id: String,

        #[arg(required = true)]
        plot_id: String,

        #[arg(required = true)]
        visual_id: String,
    },

    /// List templates
    List {
        /// Only templates of this object
        #[arg(short, long)]
        object_id: Option<String>,
    },

    /// Delete a plot template
    DeletePlot {
        #[arg(required = true)]
        object_id: String,

        #[arg(required = true)]
        plot_id: String,
    },

    /// Delete a visual template
    DeleteVisual {
        #[arg(required = true)]
        object_id: String,

        #[arg(required = true)]
        visual_id: String,
    },
}
