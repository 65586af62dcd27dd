use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use uuid::Uuid;

use super::{RecordStore, StoreError};
use crate::models::record::PersistedRecord;

/// In-process append-only store. Nothing survives a restart.
///
/// `set_failing(true)` makes every append fail, so callers can exercise
/// the store-error path.
#[derive(Default)]
pub struct MemoryStore {
    collections: Mutex<HashMap<String, Vec<(String, PersistedRecord)>>>,
    failing: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Snapshot of a collection, in append order.
    pub fn records(&self, collection: &str) -> Vec<PersistedRecord> {
        self.collections
            .lock()
            .map(|c| {
                c.get(collection)
                    .map(|docs| docs.iter().map(|(_, r)| r.clone()).collect())
                    .unwrap_or_default()
            })
            .unwrap_or_default()
    }

    /// Total records across all collections.
    pub fn len(&self) -> usize {
        self.collections
            .lock()
            .map(|c| c.values().map(Vec::len).sum())
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl RecordStore for MemoryStore {
    fn append(&self, collection: &str, record: &PersistedRecord) -> Result<String, StoreError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("memory store set to fail".into()));
        }
        let id = Uuid::new_v4().to_string();
        let mut collections = self
            .collections
            .lock()
            .map_err(|_| StoreError::Unavailable("lock poisoned".into()))?;
        collections
            .entry(collection.to_string())
            .or_default()
            .push((id.clone(), record.clone()));
        Ok(id)
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}
