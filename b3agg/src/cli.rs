//! Command-line interface definition and parsing.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Command-line arguments for the trade aggregator.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file.
    #[arg(short, long, env = "APP_CONFIG")]
    pub config: Option<PathBuf>,

    /// What to do
    #[command(subcommand)]
    pub command: Commands,
}

/// The operations the binary can perform.
#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Serve the query API over HTTP.
    Serve,

    /// Load a trade file into the database.
    Ingest {
        /// The trade file to ingest.
        #[arg(short, long, env = "FILE_PATH")]
        file: PathBuf,
    },
}

impl Cli {
    /// Parse command-line arguments.
    pub fn import() -> Result<Self, clap::Error> {
        Self::try_parse()
    }
}
