//! In-memory record backend.
//!
//! Used by tests and as a fake for callers that do not need persistence. The
//! quota is enforced exactly like the file backend's.

use std::collections::HashMap;

use parking_lot::RwLock;

use crate::store::traits::{charged_size, BackendError, RecordBackend, DEFAULT_CAPACITY_BYTES};

/// Record backend holding values in a map.
pub struct MemoryBackend {
    records: RwLock<HashMap<String, String>>,
    capacity_bytes: u64,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY_BYTES)
    }
}

impl MemoryBackend {
    pub fn new(capacity_bytes: u64) -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
            capacity_bytes,
        }
    }

    /// Bytes charged across every key.
    pub fn used_bytes(&self) -> u64 {
        self.records
            .read()
            .iter()
            .map(|(k, v)| charged_size(k) + charged_size(v))
            .sum()
    }

    /// Stores `value` without quota checks, e.g. to plant corrupt data.
    pub fn insert_raw(&self, key: &str, value: &str) {
        self.records
            .write()
            .insert(key.to_string(), value.to_string());
    }
}

impl RecordBackend for MemoryBackend {
    fn read(&self, key: &str) -> Result<Option<String>, BackendError> {
        Ok(self.records.read().get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> Result<(), BackendError> {
        let mut records = self.records.write();

        let others: u64 = records
            .iter()
            .filter(|(k, _)| k.as_str() != key)
            .map(|(k, v)| charged_size(k) + charged_size(v))
            .sum();
        let needed = others + charged_size(key) + charged_size(value);
        if needed > self.capacity_bytes {
            return Err(BackendError::QuotaExceeded {
                needed,
                capacity: self.capacity_bytes,
            });
        }

        records.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), BackendError> {
        self.records.write().remove(key);
        Ok(())
    }

    fn capacity_bytes(&self) -> u64 {
        self.capacity_bytes
    }
}
