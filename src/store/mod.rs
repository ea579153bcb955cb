//! Owner-scoped key/value storage and the analysis history built on it.
//!
//! Keys are structured `(owner_id, entry_id)` pairs. Backends compare the
//! owner segment for equality when scanning; nothing here ever decides
//! ownership by testing whether one string is a prefix of another.

pub mod history;
pub mod memory;
pub mod sqlite;

use serde_json::Value;
use thiserror::Error;

pub use history::HistoryStore;
pub use memory::MemoryKv;
pub use sqlite::SqliteKv;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Backend failure: {0}")]
    Backend(String),

    #[error("Key already exists: owner {owner_id}, entry {entry_id}")]
    Collision { owner_id: String, entry_id: String },

    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Lock poisoned")]
    LockPoisoned,
}

impl From<rusqlite::Error> for StorageError {
    fn from(err: rusqlite::Error) -> Self {
        StorageError::Backend(err.to_string())
    }
}

impl From<crate::db::DatabaseError> for StorageError {
    fn from(err: crate::db::DatabaseError) -> Self {
        StorageError::Backend(err.to_string())
    }
}

/// Composite storage key. Both segments are opaque and may contain any
/// character, including separators.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntryKey {
    pub owner_id: String,
    pub entry_id: String,
}

impl EntryKey {
    pub fn new(owner_id: impl Into<String>, entry_id: impl Into<String>) -> Self {
        Self {
            owner_id: owner_id.into(),
            entry_id: entry_id.into(),
        }
    }
}

/// Generic backing service for JSON values.
///
/// Implementations must make each single-key write atomic: a concurrent
/// reader sees either the whole value or nothing.
pub trait KvStore: Send + Sync {
    /// Write or overwrite.
    fn set(&self, key: &EntryKey, value: &Value) -> Result<(), StorageError>;

    /// Write once. Fails with `StorageError::Collision` if the key exists.
    fn insert(&self, key: &EntryKey, value: &Value) -> Result<(), StorageError>;

    fn get(&self, key: &EntryKey) -> Result<Option<Value>, StorageError>;

    /// Every value whose owner segment equals `owner_id` exactly.
    /// Order is unspecified.
    fn scan_owner(&self, owner_id: &str) -> Result<Vec<Value>, StorageError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_order_by_owner_then_entry() {
        let a = EntryKey::new("bob", "z");
        let b = EntryKey::new("bob2", "a");
        assert!(a < b);
    }

    #[test]
    fn separator_characters_do_not_merge_segments() {
        let a = EntryKey::new("bob:2", "x");
        let b = EntryKey::new("bob", "2:x");
        assert_ne!(a, b);
    }
}
