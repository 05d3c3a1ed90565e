//! Repository trait implementations for the SQLite database.

use crate::Db;
use b3_core::ports::Repository;

mod trade;

impl Repository for Db {
    type Error = sqlx::Error;
}
