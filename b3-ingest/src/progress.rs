use std::{
    fmt::Display,
    sync::{
        Mutex, PoisonError,
        atomic::{AtomicU64, Ordering},
    },
    time::{Duration, Instant},
};

/// Live counters for an ingestion run.
///
/// The pipeline only ever increments these; anything outside it may read them
/// at any time, e.g. to print progress while a large file is loading. Counters
/// are reset when a run starts, so share one `Progress` per run.
#[derive(Debug, Default)]
pub struct Progress {
    decoded: AtomicU64,
    malformed: AtomicU64,
    committed: AtomicU64,
    batches: AtomicU64,
    started: Mutex<Option<Instant>>,
}

impl Progress {
    /// Create a set of zeroed counters.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn start(&self) {
        self.decoded.store(0, Ordering::Relaxed);
        self.malformed.store(0, Ordering::Relaxed);
        self.committed.store(0, Ordering::Relaxed);
        self.batches.store(0, Ordering::Relaxed);
        *self.started.lock().unwrap_or_else(PoisonError::into_inner) = Some(Instant::now());
    }

    pub(crate) fn record_decoded(&self) {
        self.decoded.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_malformed(&self) {
        self.malformed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_batch(&self, records: usize) {
        self.committed.fetch_add(records as u64, Ordering::Relaxed);
        self.batches.fetch_add(1, Ordering::Relaxed);
    }

    /// Records the decoder has handed to the workers.
    pub fn decoded(&self) -> u64 {
        self.decoded.load(Ordering::Relaxed)
    }

    /// Lines skipped because they could not be parsed.
    pub fn malformed(&self) -> u64 {
        self.malformed.load(Ordering::Relaxed)
    }

    /// Records that are part of a committed batch.
    pub fn committed(&self) -> u64 {
        self.committed.load(Ordering::Relaxed)
    }

    /// Batches committed so far.
    pub fn batches(&self) -> u64 {
        self.batches.load(Ordering::Relaxed)
    }

    /// Time since the current run started, or zero if none has.
    pub fn elapsed(&self) -> Duration {
        let started = *self.started.lock().unwrap_or_else(PoisonError::into_inner);
        started.map(|at| at.elapsed()).unwrap_or_default()
    }

    /// Read every counter at once.
    pub fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            decoded: self.decoded(),
            malformed: self.malformed(),
            committed: self.committed(),
            batches: self.batches(),
            elapsed: self.elapsed(),
        }
    }
}

/// A point-in-time copy of [`Progress`].
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ProgressSnapshot {
    /// Records handed to the workers
    pub decoded: u64,
    /// Lines skipped as malformed
    pub malformed: u64,
    /// Records in committed batches
    pub committed: u64,
    /// Committed batches
    pub batches: u64,
    /// Time since the run started
    pub elapsed: Duration,
}

impl ProgressSnapshot {
    /// Committed records per second.
    pub fn rate(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.committed as f64 / secs
        } else {
            0.0
        }
    }
}

impl Display for ProgressSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} records | {:.1} records/s | {}s elapsed",
            self.committed,
            self.rate(),
            self.elapsed.as_secs()
        )
    }
}
