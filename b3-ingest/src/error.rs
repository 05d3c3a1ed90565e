use std::{path::PathBuf, time::Duration};
use thiserror::Error;

/// The terminal error of an ingestion run.
///
/// Malformed lines are not errors at this level; they end up in the
/// malformed-record sink and the run carries on.
#[derive(Debug, Error)]
pub enum IngestError<E> {
    /// The source file could not be opened or read
    #[error("failed to read {}: {source}", path.display())]
    Source {
        /// The file being ingested
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The repository rejected a batch
    #[error("worker {worker} failed to save batch: {source}")]
    Persistence {
        /// The worker whose batch failed
        worker: usize,
        /// The repository error
        #[source]
        source: E,
    },

    /// The run did not finish within its deadline
    #[error("ingestion exceeded its deadline of {0:?}")]
    DeadlineExceeded(Duration),

    /// The run was cancelled by the caller
    #[error("ingestion was cancelled")]
    Cancelled,

    /// A pipeline task panicked or was aborted
    #[error("ingestion task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl<E> IngestError<E> {
    /// A short, stable name for the kind of failure, suitable as a log field.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Source { .. } => "source",
            Self::Persistence { .. } => "persistence",
            Self::DeadlineExceeded(_) => "deadline",
            Self::Cancelled => "cancelled",
            Self::Task(_) => "task",
        }
    }
}
