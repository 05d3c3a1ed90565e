//! Configuration types for an ingestion run.
//!
//! These are the knobs of the worker pool and of the decoder. Every field has
//! a default, so an empty configuration section is valid.

use serde::{Deserialize, Serialize};
use std::{path::PathBuf, time::Duration};

/// Configuration for the ingestion pipeline.
///
/// # Examples
///
/// ```
/// use b3_ingest::config::IngestConfig;
/// use std::time::Duration;
///
/// // Four workers committing batches of 1000 records
/// let config = IngestConfig::default();
///
/// // A small, quick run
/// let config = IngestConfig {
///     workers: 2,
///     batch_size: 100,
///     deadline: Some(Duration::from_secs(30)),
///     ..Default::default()
/// };
/// ```
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct IngestConfig {
    /// The number of concurrent workers saving batches
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// The number of records committed per batch
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// How many decoded records may wait between the decoder and the workers
    #[serde(default = "default_queue_depth")]
    pub queue_depth: usize,

    /// The longest a run may take before it is cancelled (none if omitted)
    #[serde(default = "default_deadline", with = "humantime_serde::option")]
    pub deadline: Option<Duration>,

    /// Where to write malformed lines (logged as warnings if omitted)
    #[serde(default = "default_error_log")]
    pub error_log: Option<PathBuf>,

    /// Whether the first line of a file is a header
    #[serde(default = "default_true")]
    pub skip_header: bool,
}

fn default_workers() -> usize {
    4
}

fn default_batch_size() -> usize {
    1000
}

fn default_queue_depth() -> usize {
    1
}

fn default_deadline() -> Option<Duration> {
    Some(Duration::from_secs(14 * 60))
}

fn default_error_log() -> Option<PathBuf> {
    Some(PathBuf::from("errors.log"))
}

fn default_true() -> bool {
    true
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            batch_size: default_batch_size(),
            queue_depth: default_queue_depth(),
            deadline: default_deadline(),
            error_log: default_error_log(),
            skip_header: default_true(),
        }
    }
}
