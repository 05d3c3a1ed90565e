//! The concrete application served by the binary.

use b3_core::ports::Application;
use b3_sqlite::Db;
use time::{Date, OffsetDateTime};

/// The running service: a database and the system clock.
#[derive(Clone)]
pub struct App {
    /// Database connection for persistent storage
    pub db: Db,
}

impl Application for App {
    type Repository = Db;

    fn database(&self) -> &Self::Repository {
        &self.db
    }

    fn today(&self) -> Date {
        OffsetDateTime::now_utc().date()
    }
}
