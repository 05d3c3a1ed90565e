//! The bounded-concurrency batch writer.
//!
//! One blocking task runs the [`TradeDecoder`] and pushes records into a
//! bounded channel. A fixed pool of workers shares the receiving end: whoever
//! is ready takes the next record, so there is no static partitioning. Each
//! worker fills its own [`BatchAccumulator`] and saves it when full, and does
//! not pull more records while a save is outstanding. A full channel blocks
//! the decoder, which keeps memory bounded when storage is slower than parsing.
//!
//! A single cancellation token is shared by the decoder, the workers and the
//! deadline timer. Cancelling it stops decoding and prevents new batches from
//! being saved; saves already issued are left to finish.

use crate::{
    BatchAccumulator, IngestError, Progress, TradeDecoder, config::IngestConfig,
};
use b3_core::{
    models::TradeRecord,
    ports::{MalformedRecordSink, Repository, TradeRepository},
};
use std::{
    io::{self, BufRead},
    path::{Path, PathBuf},
    sync::{Arc, Mutex, PoisonError},
    time::Duration,
};
use tokio::{
    sync::{Mutex as AsyncMutex, mpsc},
    task::JoinSet,
};
use tokio_util::sync::CancellationToken;
use tracing::{Instrument as _, Level, Span, event, span};

/// The result of a successful ingestion run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IngestReport {
    /// Records persisted across all batches
    pub committed: u64,
    /// Batches persisted
    pub batches: u64,
    /// Lines skipped as malformed
    pub malformed: u64,
    /// Wall-clock duration of the run
    pub elapsed: Duration,
}

/// Runs ingestion of trade files into a repository.
///
/// Every collaborator is supplied at construction: the repository batches are
/// saved to, the sink malformed lines are written to, the configuration and a
/// progress handle that outside observers can poll.
pub struct Ingestor<R, S> {
    repository: R,
    sink: Arc<S>,
    config: IngestConfig,
    progress: Arc<Progress>,
}

impl<R, S> Ingestor<R, S>
where
    R: TradeRepository + Clone + Send + Sync + 'static,
    S: MalformedRecordSink + 'static,
{
    /// Assemble an ingestor from its collaborators.
    pub fn new(repository: R, sink: S, config: IngestConfig, progress: Arc<Progress>) -> Self {
        Self {
            repository,
            sink: Arc::new(sink),
            config,
            progress,
        }
    }

    /// The counters updated by [`run`](Self::run).
    pub fn progress(&self) -> &Arc<Progress> {
        &self.progress
    }

    /// The configuration this ingestor runs with.
    pub fn config(&self) -> &IngestConfig {
        &self.config
    }

    /// Ingest the trade file at `path`.
    ///
    /// Returns once the decoder and every worker have stopped. If anything
    /// went wrong the first failure recorded is returned, whether it was a
    /// source I/O error, a rejected batch or the deadline. Cancelling `cancel`
    /// from outside ends the run with [`IngestError::Cancelled`]. A deadline
    /// that elapses after the whole source was read is ignored if every
    /// record still reaches storage.
    ///
    /// Batches committed before a failure stay committed, and there is no
    /// retry: a failed batch is dropped.
    pub async fn run(
        &self,
        path: impl AsRef<Path>,
        cancel: CancellationToken,
    ) -> Result<IngestReport, IngestError<<R as Repository>::Error>> {
        let path = path.as_ref().to_path_buf();
        let span = span!(Level::INFO, "ingest", path = %path.display());
        async {
            // Failing to open the source is fatal before any work starts
            let decoder = TradeDecoder::open(&path).map_err(|source| IngestError::Source {
                path: path.clone(),
                source,
            })?;
            self.drive(path, decoder, cancel).await
        }
        .instrument(span)
        .await
    }

    /// Ingest trades read from an already open `reader`.
    ///
    /// Behaves like [`run`](Self::run); `source` only names the input in
    /// logs and in [`IngestError::Source`].
    pub async fn run_reader<B>(
        &self,
        source: impl Into<PathBuf>,
        reader: B,
        cancel: CancellationToken,
    ) -> Result<IngestReport, IngestError<<R as Repository>::Error>>
    where
        B: BufRead + Send + 'static,
    {
        let path = source.into();
        let span = span!(Level::INFO, "ingest", path = %path.display());
        self.drive(path, TradeDecoder::new(reader), cancel)
            .instrument(span)
            .await
    }

    async fn drive<B: BufRead + Send + 'static>(
        &self,
        path: PathBuf,
        decoder: TradeDecoder<B>,
        cancel: CancellationToken,
    ) -> Result<IngestReport, IngestError<<R as Repository>::Error>> {
        let decoder = decoder.skip_header(self.config.skip_header);

        self.progress.start();
        event!(
            Level::INFO,
            workers = self.config.workers,
            batch_size = self.config.batch_size,
            "starting ingestion"
        );

        let shutdown = cancel.child_token();
        let failure = Arc::new(FirstFailure::default());
        let (tx, rx) = mpsc::channel(self.config.queue_depth.max(1));
        let queue = Arc::new(AsyncMutex::new(rx));

        let decoder_task = {
            let sink = self.sink.clone();
            let progress = self.progress.clone();
            let shutdown = shutdown.clone();
            let failure = failure.clone();
            let span = Span::current();
            tokio::task::spawn_blocking(move || {
                let _entered = span.enter();
                // tx closes only after a read failure has cancelled the run
                match pump(decoder, &tx, sink.as_ref(), &progress, &shutdown) {
                    Ok(exhausted) => exhausted,
                    Err(source) => {
                        event!(Level::ERROR, error = %source, "failed to read source");
                        failure.record(IngestError::Source { path, source });
                        shutdown.cancel();
                        false
                    }
                }
            })
        };

        let timer = self.config.deadline.map(|limit| {
            let shutdown = shutdown.clone();
            let failure = failure.clone();
            tokio::spawn(async move {
                tokio::select! {
                    _ = tokio::time::sleep(limit) => {
                        event!(Level::WARN, ?limit, "deadline exceeded, cancelling ingestion");
                        failure.record(IngestError::DeadlineExceeded(limit));
                        shutdown.cancel();
                    }
                    _ = shutdown.cancelled() => {}
                }
            })
        });

        let mut workers = JoinSet::new();
        for id in 0..self.config.workers.max(1) {
            let worker = Worker {
                id,
                repository: self.repository.clone(),
                queue: queue.clone(),
                batch_size: self.config.batch_size,
                progress: self.progress.clone(),
                shutdown: shutdown.clone(),
            };
            workers.spawn(worker.run().instrument(span!(Level::INFO, "worker", id)));
        }
        // Only the workers may keep the receiver alive, so the decoder notices
        // when all of them are gone.
        drop(queue);

        let mut drained = true;
        while let Some(joined) = workers.join_next().await {
            match joined.map_err(IngestError::from).and_then(|result| result) {
                Ok(flushed) => drained &= flushed,
                Err(err) => {
                    event!(Level::ERROR, error = %err, "worker failed, shutting down");
                    failure.record(err);
                    shutdown.cancel();
                    drained = false;
                }
            }
        }

        if let Some(timer) = timer {
            timer.abort();
        }
        let exhausted = match decoder_task.await {
            Ok(exhausted) => exhausted,
            Err(err) => {
                failure.record(err.into());
                false
            }
        };

        let snapshot = self.progress.snapshot();
        let failure = match failure.take() {
            // the source was read in full and every record was committed
            Some(IngestError::DeadlineExceeded(limit)) if exhausted && drained => {
                event!(Level::DEBUG, ?limit, "deadline elapsed after the last commit");
                None
            }
            other => other,
        };
        if let Some(err) = failure {
            event!(
                Level::ERROR,
                kind = err.kind(),
                error = %err,
                committed = snapshot.committed,
                "ingestion failed"
            );
            return Err(err);
        }
        if cancel.is_cancelled() {
            event!(
                Level::WARN,
                committed = snapshot.committed,
                "ingestion cancelled"
            );
            return Err(IngestError::Cancelled);
        }

        event!(
            Level::INFO,
            committed = snapshot.committed,
            batches = snapshot.batches,
            malformed = snapshot.malformed,
            elapsed = ?snapshot.elapsed,
            "ingestion complete"
        );
        Ok(IngestReport {
            committed: snapshot.committed,
            batches: snapshot.batches,
            malformed: snapshot.malformed,
            elapsed: snapshot.elapsed,
        })
    }
}

/// Drive the decoder to completion on the current (blocking) thread.
///
/// Returns whether the source was read to its end. Stops early, without
/// error, when the run is cancelled or every worker has hung up.
fn pump<B: BufRead, S: MalformedRecordSink + ?Sized>(
    decoder: TradeDecoder<B>,
    tx: &mpsc::Sender<TradeRecord>,
    sink: &S,
    progress: &Progress,
    shutdown: &CancellationToken,
) -> io::Result<bool> {
    for item in decoder {
        if shutdown.is_cancelled() {
            event!(Level::DEBUG, "decoder cancelled");
            return Ok(false);
        }
        match item? {
            Ok(record) => {
                if tx.blocking_send(record).is_err() {
                    event!(Level::DEBUG, "all workers stopped, decoder exiting");
                    return Ok(false);
                }
                progress.record_decoded();
            }
            Err(failure) => {
                progress.record_malformed();
                if let Err(err) = sink.record(&failure) {
                    event!(
                        Level::WARN,
                        line = failure.line_number,
                        error = %err,
                        "failed to record malformed line"
                    );
                }
            }
        }
    }
    Ok(true)
}

/// A write-once slot for the first failure of a run.
struct FirstFailure<E>(Mutex<Option<IngestError<E>>>);

impl<E> Default for FirstFailure<E> {
    fn default() -> Self {
        Self(Mutex::new(None))
    }
}

impl<E> FirstFailure<E> {
    /// Keep `err` unless a failure was already recorded.
    fn record(&self, err: IngestError<E>) {
        let mut slot = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.is_none() {
            *slot = Some(err);
        }
    }

    fn take(&self) -> Option<IngestError<E>> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).take()
    }
}

struct Worker<R> {
    id: usize,
    repository: R,
    queue: Arc<AsyncMutex<mpsc::Receiver<TradeRecord>>>,
    batch_size: usize,
    progress: Arc<Progress>,
    shutdown: CancellationToken,
}

impl<R: TradeRepository> Worker<R> {
    /// Save batches until the queue closes or the run is cancelled.
    ///
    /// Returns `true` when the queue ran dry and everything taken from it was
    /// committed.
    async fn run(self) -> Result<bool, IngestError<R::Error>> {
        let mut batch = BatchAccumulator::new(self.batch_size);

        loop {
            let next = tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => {
                    event!(Level::DEBUG, discarded = batch.len(), "worker cancelled");
                    return Ok(false);
                }
                record = self.next_record() => record,
            };

            let Some(record) = next else {
                break;
            };

            if batch.push(record) {
                if self.shutdown.is_cancelled() {
                    return Ok(false);
                }
                self.save(batch.drain()).await?;
            }
        }

        // the stream ran dry: flush what is left, once
        if !batch.is_empty() {
            if self.shutdown.is_cancelled() {
                event!(Level::DEBUG, discarded = batch.len(), "worker cancelled");
                return Ok(false);
            }
            self.save(batch.drain()).await?;
        }
        Ok(true)
    }

    async fn next_record(&self) -> Option<TradeRecord> {
        self.queue.lock().await.recv().await
    }

    async fn save(&self, records: Vec<TradeRecord>) -> Result<(), IngestError<R::Error>> {
        let len = records.len();
        self.repository
            .save_batch(records)
            .await
            .map_err(|source| IngestError::Persistence {
                worker: self.id,
                source,
            })?;
        self.progress.record_batch(len);
        event!(Level::DEBUG, records = len, "committed batch");
        Ok(())
    }
}
