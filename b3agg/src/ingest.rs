//! The `ingest` command: one run of the pipeline with progress reporting.

use anyhow::Context as _;
use b3_core::ports::MalformedRecordSink;
use b3_ingest::{
    FileSink, IngestReport, Ingestor, Progress, TracingSink, config::IngestConfig,
};
use b3_sqlite::Db;
use std::{
    fmt::Display,
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};
use tokio_util::sync::CancellationToken;
use tracing::{Level, event};

const PROGRESS_INTERVAL: Duration = Duration::from_secs(2);
const MEBIBYTE: f64 = 1024.0 * 1024.0;

/// Final statistics of a successful run.
#[derive(Debug, Clone)]
pub struct IngestSummary {
    /// The ingested file
    pub file: PathBuf,
    /// Its size in bytes
    pub size: u64,
    /// What the pipeline reported
    pub report: IngestReport,
}

impl IngestSummary {
    /// Records committed per second.
    pub fn records_per_second(&self) -> f64 {
        per_second(self.report.committed as f64, self.report.elapsed)
    }

    /// Megabytes of input consumed per second.
    pub fn megabytes_per_second(&self) -> f64 {
        per_second(self.size as f64 / MEBIBYTE, self.report.elapsed)
    }
}

fn per_second(amount: f64, elapsed: Duration) -> f64 {
    let secs = elapsed.as_secs_f64();
    if secs > 0.0 { amount / secs } else { 0.0 }
}

impl Display for IngestSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "file: {} ({:.1} MB) | records: {} | malformed: {} | elapsed: {:.1}s | {:.1} records/s | {:.2} MB/s",
            self.file.display(),
            self.size as f64 / MEBIBYTE,
            self.report.committed,
            self.report.malformed,
            self.report.elapsed.as_secs_f64(),
            self.records_per_second(),
            self.megabytes_per_second(),
        )
    }
}

/// Ingest `file` into `db`.
///
/// Progress is logged every two seconds until the run ends. Cancelling
/// `cancel` stops the run; batches already committed stay in the database.
pub async fn ingest_file(
    file: &Path,
    db: Db,
    config: IngestConfig,
    cancel: CancellationToken,
) -> anyhow::Result<IngestSummary> {
    let size = std::fs::metadata(file)
        .with_context(|| format!("cannot read trade file {}", file.display()))?
        .len();
    event!(
        Level::INFO,
        file = %file.display(),
        size_mb = size as f64 / MEBIBYTE,
        "processing trade file"
    );

    let sink: Arc<dyn MalformedRecordSink> = match &config.error_log {
        Some(path) => Arc::new(FileSink::new(path)),
        None => Arc::new(TracingSink),
    };
    let progress = Arc::new(Progress::new());
    let ingestor = Ingestor::new(db, sink, config, progress.clone());

    let reporting = CancellationToken::new();
    let reporter = tokio::spawn(report_progress(progress, reporting.clone()));

    let result = ingestor.run(file, cancel).await;
    reporting.cancel();
    reporter.await?;

    match result {
        Ok(report) => {
            let summary = IngestSummary {
                file: file.to_path_buf(),
                size,
                report,
            };
            event!(Level::INFO, "{summary}");
            Ok(summary)
        }
        Err(err) => {
            event!(
                Level::ERROR,
                kind = err.kind(),
                committed = ingestor.progress().committed(),
                "ingestion did not complete"
            );
            Err(err.into())
        }
    }
}

async fn report_progress(progress: Arc<Progress>, stop: CancellationToken) {
    let mut ticks = tokio::time::interval(PROGRESS_INTERVAL);
    // the first tick completes immediately
    ticks.tick().await;
    loop {
        tokio::select! {
            _ = stop.cancelled() => return,
            _ = ticks.tick() => event!(Level::INFO, "{}", progress.snapshot()),
        }
    }
}
