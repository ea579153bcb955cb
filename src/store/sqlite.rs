//! SQLite backend for the key/value contract.
//!
//! Rows live in `kv_entries(owner_id, entry_id, value)` with a composite
//! primary key. Scans filter with `owner_id = ?1`, never `LIKE`.

use std::path::Path;
use std::sync::{Arc, Mutex};

use rusqlite::{params, Connection, ErrorCode, OptionalExtension};
use serde_json::Value;

use super::{EntryKey, KvStore, StorageError};
use crate::db::{self, SharedConnection};

pub struct SqliteKv {
    conn: SharedConnection,
}

impl SqliteKv {
    /// Open (or create) a database file and run migrations.
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| StorageError::Backend(format!("create {}: {e}", parent.display())))?;
        }
        let conn = db::open_database(path)?;
        tracing::info!(path = %path.display(), "History database opened");
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn open_in_memory() -> Result<Self, StorageError> {
        let conn = db::open_memory_database()?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// The connection this store writes through, for other stores that
    /// live in the same database file.
    pub fn connection(&self) -> SharedConnection {
        Arc::clone(&self.conn)
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, StorageError> {
        self.conn.lock().map_err(|_| StorageError::LockPoisoned)
    }
}

fn decode(text: String) -> Result<Value, StorageError> {
    Ok(serde_json::from_str(&text)?)
}

impl KvStore for SqliteKv {
    fn set(&self, key: &EntryKey, value: &Value) -> Result<(), StorageError> {
        let text = serde_json::to_string(value)?;
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO kv_entries (owner_id, entry_id, value) VALUES (?1, ?2, ?3)
             ON CONFLICT (owner_id, entry_id) DO UPDATE SET value = excluded.value",
            params![key.owner_id, key.entry_id, text],
        )?;
        Ok(())
    }

    fn insert(&self, key: &EntryKey, value: &Value) -> Result<(), StorageError> {
        let text = serde_json::to_string(value)?;
        let conn = self.lock()?;
        let result = conn.execute(
            "INSERT INTO kv_entries (owner_id, entry_id, value) VALUES (?1, ?2, ?3)",
            params![key.owner_id, key.entry_id, text],
        );
        match result {
            Ok(_) => Ok(()),
            Err(rusqlite::Error::SqliteFailure(e, _)) if e.code == ErrorCode::ConstraintViolation => {
                Err(StorageError::Collision {
                    owner_id: key.owner_id.clone(),
                    entry_id: key.entry_id.clone(),
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    fn get(&self, key: &EntryKey) -> Result<Option<Value>, StorageError> {
        let conn = self.lock()?;
        let text: Option<String> = conn
            .query_row(
                "SELECT value FROM kv_entries WHERE owner_id = ?1 AND entry_id = ?2",
                params![key.owner_id, key.entry_id],
                |row| row.get(0),
            )
            .optional()?;
        text.map(decode).transpose()
    }

    fn scan_owner(&self, owner_id: &str) -> Result<Vec<Value>, StorageError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT value FROM kv_entries WHERE owner_id = ?1")?;
        let rows = stmt
            .query_map(params![owner_id], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        rows.into_iter().map(decode).collect()
    }
}
