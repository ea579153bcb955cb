pub mod repository;
pub mod sqlite;

pub use sqlite::*;

use std::sync::{Arc, Mutex};

use rusqlite::{Connection, ErrorCode};
use thiserror::Error;

/// One connection shared by every store that lives in the same database file.
pub type SharedConnection = Arc<Mutex<Connection>>;

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Migration failed at version {version}: {reason}")]
    MigrationFailed { version: i64, reason: String },
}

impl DatabaseError {
    pub fn is_constraint_violation(&self) -> bool {
        matches!(
            self,
            DatabaseError::Sqlite(rusqlite::Error::SqliteFailure(e, _))
                if e.code == ErrorCode::ConstraintViolation
        )
    }
}
