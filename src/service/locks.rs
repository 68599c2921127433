//! Per-license write serialization.
//!
//! The store has no compare-and-swap, so two activations racing on one record
//! could both pass the device limit check and both write. Every
//! read-modify-write on a license key runs under that key's guard. This only
//! covers one process: instances sharing a store can still lose updates.

use std::collections::HashSet;
use std::sync::{Condvar, Mutex};

#[derive(Debug, Default)]
pub(crate) struct KeyLocks {
    held: Mutex<HashSet<String>>,
    released: Condvar,
}

impl KeyLocks {
    /// Block until no one else holds `key`, then hold it until the guard drops.
    pub(crate) fn acquire(&self, key: &str) -> KeyGuard<'_> {
        let mut held = self.held.lock().unwrap_or_else(|e| e.into_inner());
        while held.contains(key) {
            held = self
                .released
                .wait(held)
                .unwrap_or_else(|e| e.into_inner());
        }
        held.insert(key.to_string());
        KeyGuard {
            locks: self,
            key: key.to_string(),
        }
    }

    #[cfg(test)]
    fn held_count(&self) -> usize {
        self.held.lock().map(|h| h.len()).unwrap_or(0)
    }
}

pub(crate) struct KeyGuard<'a> {
    locks: &'a KeyLocks,
    key: String,
}

impl Drop for KeyGuard<'_> {
    fn drop(&mut self) {
        let mut held = self.locks.held.lock().unwrap_or_else(|e| e.into_inner());
        held.remove(&self.key);
        drop(held);
        self.locks.released.notify_all();
    }
}
