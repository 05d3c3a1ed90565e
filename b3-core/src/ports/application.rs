use super::TradeRepository;
use time::Date;

/// The view a request handler has of the running service.
///
/// Bundling the repository with a clock lets the HTTP layer stay generic over
/// storage and lets tests pin "today" when resolving default query windows.
pub trait Application {
    /// The storage backend
    type Repository: TradeRepository;

    /// Get a reference to the repository
    fn database(&self) -> &Self::Repository;

    /// The current calendar date
    fn today(&self) -> Date;
}
