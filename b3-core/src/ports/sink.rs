use crate::models::ParseFailure;

/// Destination for lines of the feed that could not be decoded.
///
/// Sinks are append only and best effort: the ingestion pipeline logs a
/// failing write and carries on, it never aborts because a diagnostic was lost.
///
/// The decoder calls this from a blocking thread, so a synchronous write is fine.
pub trait MalformedRecordSink: Send + Sync {
    /// Append one diagnostic.
    fn record(&self, failure: &ParseFailure) -> std::io::Result<()>;
}

impl<T: MalformedRecordSink + ?Sized> MalformedRecordSink for std::sync::Arc<T> {
    fn record(&self, failure: &ParseFailure) -> std::io::Result<()> {
        (**self).record(failure)
    }
}
