mod application;
mod sink;
mod trade;

pub use application::Application;
pub use sink::MalformedRecordSink;
pub use trade::TradeRepository;

/// Base trait for all storage backends.
///
/// The associated error type is shared by every repository operation, which
/// lets the ingestion pipeline surface the backend's native error without
/// boxing it.
pub trait Repository {
    /// The error type for underlying operations
    type Error: std::error::Error + Send + Sync + 'static;
}
