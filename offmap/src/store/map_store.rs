//! The map cache store.
//!
//! All offline maps live together as one JSON array under a single backend
//! key. Every mutation is a read-modify-write of that array, serialized by a
//! process-local lock.

use parking_lot::Mutex;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::store::record::StoredMap;
use crate::store::traits::{charged_size, BackendError, RecordBackend};

/// Backend key used when none is configured.
pub const DEFAULT_STORE_KEY: &str = "sf-maps";

/// Usage fraction at which the store is reported as nearly full.
pub const NEARLY_FULL_FRACTION: f64 = 0.9;

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Errors raised while writing the store.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("Storage backend error: {0}")]
    Backend(#[from] BackendError),

    #[error("Failed to serialize maps: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl PersistError {
    /// Whether the failure was the backend running out of room.
    pub fn is_quota_exceeded(&self) -> bool {
        matches!(self, Self::Backend(BackendError::QuotaExceeded { .. }))
    }
}

/// Storage consumption snapshot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StorageStats {
    pub used_bytes: u64,
    pub capacity_bytes: u64,
    pub map_count: usize,
}

impl StorageStats {
    /// Used share of the quota in `0.0..=1.0`.
    pub fn fraction(&self) -> f64 {
        if self.capacity_bytes == 0 {
            return 0.0;
        }
        (self.used_bytes as f64 / self.capacity_bytes as f64).min(1.0)
    }

    pub fn used_mb(&self) -> f64 {
        self.used_bytes as f64 / BYTES_PER_MB
    }

    pub fn capacity_mb(&self) -> f64 {
        self.capacity_bytes as f64 / BYTES_PER_MB
    }

    pub fn is_nearly_full(&self) -> bool {
        self.fraction() >= NEARLY_FULL_FRACTION
    }
}

/// Collection of downloaded maps persisted under one backend key.
pub struct MapStore<B: RecordBackend> {
    backend: B,
    key: String,
    write_lock: Mutex<()>,
}

impl<B: RecordBackend> MapStore<B> {
    pub fn new(backend: B, key: impl Into<String>) -> Self {
        Self {
            backend,
            key: key.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Store using [`DEFAULT_STORE_KEY`].
    pub fn with_default_key(backend: B) -> Self {
        Self::new(backend, DEFAULT_STORE_KEY)
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Every stored map, in insertion order.
    ///
    /// Never fails: a missing record is an empty store, and unreadable or
    /// corrupt data is logged and treated as empty.
    pub fn list(&self) -> Vec<StoredMap> {
        let raw = match self.backend.read(&self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                warn!(key = %self.key, error = %e, "Failed to read map store");
                return Vec::new();
            }
        };

        match serde_json::from_str(&raw) {
            Ok(maps) => maps,
            Err(e) => {
                warn!(key = %self.key, error = %e, "Map store is corrupt, treating as empty");
                Vec::new()
            }
        }
    }

    /// Looks up one map by id.
    pub fn get(&self, id: &str) -> Option<StoredMap> {
        self.list().into_iter().find(|m| m.id == id)
    }

    /// Inserts `map`, replacing any stored map with the same id in place.
    ///
    /// # Errors
    ///
    /// Returns [`PersistError`] if the backend rejects the write; the stored
    /// collection is then unchanged.
    pub fn upsert(&self, map: StoredMap) -> Result<(), PersistError> {
        let _guard = self.write_lock.lock();

        let mut maps = self.list();
        let id = map.id.clone();
        let tiles = map.tile_count();
        match maps.iter_mut().find(|m| m.id == map.id) {
            Some(existing) => *existing = map,
            None => maps.push(map),
        }

        self.write(&maps)?;
        info!(map = %id, tiles, maps = maps.len(), "Stored offline map");
        Ok(())
    }

    /// Removes the map with `id`. Absent ids are a no-op.
    pub fn delete(&self, id: &str) -> Result<(), PersistError> {
        let _guard = self.write_lock.lock();

        let mut maps = self.list();
        let before = maps.len();
        maps.retain(|m| m.id != id);
        if maps.len() == before {
            debug!(map = %id, "Delete of unknown map ignored");
            return Ok(());
        }

        self.write(&maps)?;
        info!(map = %id, remaining = maps.len(), "Deleted offline map");
        Ok(())
    }

    /// Removes every stored map.
    pub fn clear(&self) -> Result<(), PersistError> {
        let _guard = self.write_lock.lock();
        self.backend.remove(&self.key)?;
        info!(key = %self.key, "Cleared all offline maps");
        Ok(())
    }

    /// Size of the stored record in megabytes (two bytes per UTF-16 unit).
    pub fn usage_mb(&self) -> f64 {
        self.used_bytes() as f64 / BYTES_PER_MB
    }

    /// Current consumption against the backend quota.
    pub fn stats(&self) -> StorageStats {
        StorageStats {
            used_bytes: self.used_bytes(),
            capacity_bytes: self.backend.capacity_bytes(),
            map_count: self.list().len(),
        }
    }

    fn used_bytes(&self) -> u64 {
        match self.backend.read(&self.key) {
            Ok(Some(raw)) => charged_size(&raw),
            Ok(None) => 0,
            Err(e) => {
                warn!(key = %self.key, error = %e, "Failed to read map store");
                0
            }
        }
    }

    fn write(&self, maps: &[StoredMap]) -> Result<(), PersistError> {
        let json = serde_json::to_string(maps)?;
        self.backend.write(&self.key, &json)?;
        Ok(())
    }
}
