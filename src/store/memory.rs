use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::{PoisonError, RwLock};

use serde_json::Value;

use super::{EntryKey, KvStore, StorageError};

/// In-process backend. Used for tests and `:memory:` deployments.
#[derive(Default)]
pub struct MemoryKv {
    entries: RwLock<BTreeMap<EntryKey, Value>>,
}

impl MemoryKv {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KvStore for MemoryKv {
    fn set(&self, key: &EntryKey, value: &Value) -> Result<(), StorageError> {
        let mut map = self.entries.write().map_err(|_| StorageError::LockPoisoned)?;
        map.insert(key.clone(), value.clone());
        Ok(())
    }

    fn insert(&self, key: &EntryKey, value: &Value) -> Result<(), StorageError> {
        let mut map = self.entries.write().map_err(|_| StorageError::LockPoisoned)?;
        match map.entry(key.clone()) {
            Entry::Occupied(_) => Err(StorageError::Collision {
                owner_id: key.owner_id.clone(),
                entry_id: key.entry_id.clone(),
            }),
            Entry::Vacant(slot) => {
                slot.insert(value.clone());
                Ok(())
            }
        }
    }

    fn get(&self, key: &EntryKey) -> Result<Option<Value>, StorageError> {
        let map = self.entries.read().map_err(|_| StorageError::LockPoisoned)?;
        Ok(map.get(key).cloned())
    }

    fn scan_owner(&self, owner_id: &str) -> Result<Vec<Value>, StorageError> {
        let map = self.entries.read().map_err(|_| StorageError::LockPoisoned)?;
        // Keys sort by owner first, so one owner's entries are contiguous
        // starting at (owner_id, "").
        let start = EntryKey::new(owner_id, "");
        Ok(map
            .range((Bound::Included(start), Bound::Unbounded))
            .take_while(|(key, _)| key.owner_id == owner_id)
            .map(|(_, value)| value.clone())
            .collect())
    }
}
