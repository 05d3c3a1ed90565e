#![warn(missing_docs)]
#![doc = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/README.md"))]

pub mod impls;

mod cli;
pub use cli::{Cli, Commands};

mod config;
pub use config::AppConfig;

mod ingest;
pub use ingest::{IngestSummary, ingest_file};
