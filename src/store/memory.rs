use std::collections::BTreeMap;
use std::sync::RwLock;

use super::{LicenseStore, StoreError, StoreResult};

/// In-process store. Backs the test suite and `--memory` dev runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy of every entry, for asserting on store state.
    pub fn snapshot(&self) -> BTreeMap<String, String> {
        self.entries.read().map(|e| e.clone()).unwrap_or_default()
    }
}

fn poisoned<T>(_: T) -> StoreError {
    StoreError::Backend("memory store lock poisoned".into())
}

impl LicenseStore for MemoryStore {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(self.entries.read().map_err(poisoned)?.get(key).cloned())
    }

    fn put(&self, key: &str, value: &str) -> StoreResult<()> {
        self.entries
            .write()
            .map_err(poisoned)?
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&self, key: &str) -> StoreResult<()> {
        self.entries.write().map_err(poisoned)?.remove(key);
        Ok(())
    }

    fn list(&self) -> StoreResult<Vec<String>> {
        Ok(self.entries.read().map_err(poisoned)?.keys().cloned().collect())
    }
}
