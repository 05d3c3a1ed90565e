use b3_core::models::TradeRecord;

/// A per-worker buffer that groups records into fixed-size batches.
///
/// This is a plain data structure: it knows nothing about persistence,
/// retrying or concurrency. A worker pushes records until the accumulator
/// reports it is full, then drains it and hands the batch off.
#[derive(Debug)]
pub struct BatchAccumulator {
    records: Vec<TradeRecord>,
    batch_size: usize,
}

impl BatchAccumulator {
    /// Create an empty accumulator. A `batch_size` of 0 is treated as 1.
    pub fn new(batch_size: usize) -> Self {
        let batch_size = batch_size.max(1);
        Self {
            records: Vec::with_capacity(batch_size),
            batch_size,
        }
    }

    /// Append a record, returning whether the batch is now full.
    ///
    /// Pushing onto a full accumulator is a logic error; drain it first.
    pub fn push(&mut self, record: TradeRecord) -> bool {
        debug_assert!(!self.is_full(), "pushed onto a full batch");
        self.records.push(record);
        self.is_full()
    }

    /// Whether the batch has reached its configured size.
    pub fn is_full(&self) -> bool {
        self.records.len() >= self.batch_size
    }

    /// The number of buffered records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether no records are buffered.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The configured batch size.
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Take the buffered records, leaving the accumulator empty.
    ///
    /// Records returned here are never returned again by a later drain.
    pub fn drain(&mut self) -> Vec<TradeRecord> {
        std::mem::replace(&mut self.records, Vec::with_capacity(self.batch_size))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use time::macros::date;

    fn record(quantity: u64) -> TradeRecord {
        TradeRecord {
            trade_date: date!(2024 - 05 - 02),
            instrument_code: "PETR4".into(),
            negotiated_price: Decimal::new(1950, 2),
            negotiated_quantity: quantity,
            closing_time: "103000123".into(),
        }
    }

    #[test]
    fn reports_full_at_batch_size() {
        let mut batch = BatchAccumulator::new(2);
        assert!(!batch.push(record(1)));
        assert!(batch.push(record(2)));
        assert!(batch.is_full());
        assert_eq!(batch.len(), 2);
    }

    #[test]
    fn drain_resets_the_buffer() {
        let mut batch = BatchAccumulator::new(3);
        batch.push(record(1));
        batch.push(record(2));

        let first = batch.drain();
        assert_eq!(first.len(), 2);
        assert!(batch.is_empty());

        batch.push(record(3));
        let second = batch.drain();
        assert_eq!(second, vec![record(3)]);
        assert!(batch.drain().is_empty());
    }

    #[test]
    fn zero_batch_size_means_one() {
        let mut batch = BatchAccumulator::new(0);
        assert_eq!(batch.batch_size(), 1);
        assert!(batch.push(record(1)));
    }
}
