use crate::models::{AggregatedData, AggregationWindow, TradeRecord};

/// Repository interface for persisting trades and querying their statistics.
///
/// This is the persistence gateway of the ingestion pipeline. Many workers
/// call [`save_batch`](TradeRepository::save_batch) concurrently, so every
/// call must be atomic on its own.
pub trait TradeRepository: super::Repository {
    /// Persist a batch of trades as a single unit.
    ///
    /// Either every record of the batch becomes visible or none of them do.
    /// Implementations should be bulk oriented rather than row by row. An empty
    /// batch is a no-op.
    ///
    /// The batch is consumed: a failed batch is not handed back for retrying.
    fn save_batch(
        &self,
        batch: Vec<TradeRecord>,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Compute the statistics of an instrument for all trades inside `window`.
    ///
    /// # Returns
    ///
    /// - Ok(Some(data)) if at least one trade falls in the window
    /// - Ok(None) if there is nothing to aggregate
    /// - Err(repository_error) if the query itself failed
    fn aggregate(
        &self,
        instrument_code: &str,
        window: AggregationWindow,
    ) -> impl Future<Output = Result<Option<AggregatedData>, Self::Error>> + Send;
}
