//! Command-line interface using clap.

mod commands;

pub use commands::cmd_load;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Ladle - recipe sharing backend
#[derive(Parser)]
#[command(name = "ladle")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP API server
    #[command(alias = "-s", alias = "--serve")]
    Serve,

    /// Import the static ingredient/tag catalog (idempotent)
    Load {
        /// Ingredients dataset: [{"name", "measurement_unit"}]
        #[arg(long)]
        ingredients: Option<PathBuf>,

        /// Tags dataset: [{"name", "color", "slug"}]
        #[arg(long)]
        tags: Option<PathBuf>,

        /// Unit plural forms: [{"name", "plural_first", "plural_second"}]
        #[arg(long)]
        units: Option<PathBuf>,
    },

    /// Create default config file
    Init,
}
