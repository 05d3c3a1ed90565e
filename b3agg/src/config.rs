//! Application configuration management.
//!
//! Configuration is merged from default values, an optional file and
//! environment variables, in increasing order of precedence.

use crate::Cli;
use serde::{Deserialize, Serialize};

/// The main application configuration that composes all component configs
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct AppConfig {
    /// Web server configuration
    #[serde(default)]
    pub server: b3_axum::config::AxumConfig,

    /// Database configuration
    #[serde(default)]
    pub database: b3_sqlite::config::SqliteConfig,

    /// Ingestion pipeline configuration
    #[serde(default)]
    pub ingest: b3_ingest::config::IngestConfig,
}

impl AppConfig {
    /// Load configuration from multiple sources with precedence:
    /// 1. Environment variables (highest priority)
    /// 2. Config file given by the CLI
    /// 3. Default values (lowest priority)
    ///
    /// Environment variables are mapped using the pattern:
    /// `APP_<SECTION>__<KEY>` maps to `<section>.<key>`
    ///
    /// # Examples
    ///
    /// ```bash
    /// # Store trades in a file instead of memory
    /// export APP_DATABASE__DATABASE_PATH="trades.db"
    ///
    /// # Set server bind address
    /// export APP_SERVER__BIND_ADDRESS="0.0.0.0:3000"
    ///
    /// # Use more workers
    /// export APP_INGEST__WORKERS=8
    /// ```
    pub fn load(cli: &Cli) -> anyhow::Result<Self> {
        Self::load_from(
            cli,
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
    }

    fn load_from(cli: &Cli, environment: config::Environment) -> anyhow::Result<Self> {
        let mut config = config::Config::builder();

        // Start with default values
        config = config.add_source(config::Config::try_from(&Self::default())?);

        // Layer on config file if it is specified and exists
        if let Some(path) = &cli.config {
            if path.exists() {
                config = config.add_source(config::File::from(path.as_path()))
            } else {
                return Err(anyhow::anyhow!(
                    "Config file {} does not exist",
                    path.display()
                ));
            }
        }

        // Override with environment variables
        config = config.add_source(environment);

        let built_config = config.build()?;
        built_config.try_deserialize().map_err(Into::into)
    }
}
