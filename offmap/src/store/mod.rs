//! Map cache store.
//!
//! Persists fully downloaded maps as a single JSON record with a byte quota.
//!
//! # Example
//!
//! ```
//! use offmap::store::{MapStore, MemoryBackend};
//!
//! let store = MapStore::with_default_key(MemoryBackend::default());
//! assert!(store.list().is_empty());
//! assert_eq!(store.usage_mb(), 0.0);
//! ```

mod backends;
mod map_store;
mod record;
mod traits;

pub use backends::{FileBackend, MemoryBackend};
pub use map_store::{MapStore, PersistError, StorageStats, DEFAULT_STORE_KEY, NEARLY_FULL_FRACTION};
pub use record::{StoredMap, FORMAT_VERSION};
pub use traits::{charged_size, BackendError, RecordBackend, DEFAULT_CAPACITY_BYTES};

#[cfg(test)]
pub(crate) use record::tests::sample_map;
