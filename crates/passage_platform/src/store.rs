//! Browser-local key-value storage abstraction
//!
//! One fixed-key record is all the framework persists (the first-visit
//! marker), but the contract is a general string store so hosts can back it
//! with whatever the platform offers. Storage is allowed to fail; callers
//! are expected to degrade, never to surface the error to the page.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use rustc_hash::FxHashMap;
use thiserror::Error;

/// Storage errors
#[derive(Error, Debug)]
pub enum StoreError {
    /// Backing storage cannot be reached
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    /// A write was rejected (quota, permissions)
    #[error("Storage write failed: {0}")]
    Write(String),
}

/// Persisted string storage
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// In-memory [`KeyValueStore`] with a switchable failing mode for tests
pub struct MemoryStore {
    data: Mutex<FxHashMap<String, String>>,
    failing: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            data: Mutex::new(FxHashMap::default()),
            failing: AtomicBool::new(false),
        }
    }

    /// Make every subsequent operation fail (storage-failure tests)
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::Relaxed);
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.failing.load(Ordering::Relaxed) {
            Err(StoreError::Unavailable("memory store in failing mode".into()))
        } else {
            Ok(())
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.check()?;
        Ok(self.data.lock().unwrap().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.check()?;
        self.data
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.check()?;
        self.data.lock().unwrap().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip() {
        let store = MemoryStore::new();
        assert!(store.get("k").unwrap().is_none());
        store.set("k", "v").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("v"));
        store.remove("k").unwrap();
        assert!(store.get("k").unwrap().is_none());
    }

    #[test]
    fn test_failing_mode() {
        let store = MemoryStore::new();
        store.set("k", "v").unwrap();
        store.set_failing(true);
        assert!(store.get("k").is_err());
        assert!(store.set("k", "w").is_err());
    }
}
