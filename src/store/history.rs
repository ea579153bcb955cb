//! Append-only, owner-scoped history of analyses.

use std::cmp::Ordering;
use std::sync::Arc;

use super::{EntryKey, KvStore, StorageError};
use crate::models::SymptomEntry;

#[derive(Clone)]
pub struct HistoryStore {
    kv: Arc<dyn KvStore>,
}

impl HistoryStore {
    pub fn new(kv: Arc<dyn KvStore>) -> Self {
        Self { kv }
    }

    /// Persist a new entry under `(owner_id, id)`.
    ///
    /// The value is serialized before the single write is issued. An
    /// existing key is an error, never an overwrite.
    pub fn append(&self, entry: &SymptomEntry) -> Result<(), StorageError> {
        let key = EntryKey::new(&entry.owner_id, &entry.id);
        let value = serde_json::to_value(entry)?;
        self.kv.insert(&key, &value)?;
        tracing::debug!(owner_id = %entry.owner_id, entry_id = %entry.id, "History entry appended");
        Ok(())
    }

    /// All entries for `owner_id`, newest first. Equal timestamps fall
    /// back to ascending entry id so the order is stable across calls.
    pub fn list_by_owner(&self, owner_id: &str) -> Result<Vec<SymptomEntry>, StorageError> {
        let mut entries = Vec::new();
        for value in self.kv.scan_owner(owner_id)? {
            let entry: SymptomEntry = serde_json::from_value(value)?;
            if entry.owner_id != owner_id {
                tracing::warn!(
                    scanned_owner = %owner_id,
                    entry_id = %entry.id,
                    "Skipping history value whose owner does not match its key"
                );
                continue;
            }
            entries.push(entry);
        }
        entries.sort_by(newest_first);
        Ok(entries)
    }

    /// One entry, only if it belongs to `owner_id`.
    pub fn get(&self, owner_id: &str, entry_id: &str) -> Result<Option<SymptomEntry>, StorageError> {
        let Some(value) = self.kv.get(&EntryKey::new(owner_id, entry_id))? else {
            return Ok(None);
        };
        let entry: SymptomEntry = serde_json::from_value(value)?;
        Ok((entry.owner_id == owner_id).then_some(entry))
    }
}

fn newest_first(a: &SymptomEntry, b: &SymptomEntry) -> Ordering {
    b.timestamp
        .cmp(&a.timestamp)
        .then_with(|| a.id.cmp(&b.id))
}
