//! Backing medium for the map store.
//!
//! A [`RecordBackend`] is a named-record key/value facility with a byte
//! quota, modelled on browser local storage: values are strings, sizes are
//! counted as two bytes per UTF-16 code unit, and a write that would exceed
//! the quota is rejected without touching the stored value.

use thiserror::Error;

/// Default quota, matching browser local storage.
pub const DEFAULT_CAPACITY_BYTES: u64 = 5 * 1024 * 1024;

/// Errors raised by a backend.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The write would put the backend over its quota.
    #[error("Quota exceeded: {needed} bytes needed, {capacity} bytes available")]
    QuotaExceeded { needed: u64, capacity: u64 },
}

/// Bytes charged for storing `value`.
pub fn charged_size(value: &str) -> u64 {
    value.encode_utf16().count() as u64 * 2
}

/// Named-record storage with a capacity ceiling.
///
/// `write` must be all-or-nothing: when it fails the previous value is left
/// as it was.
pub trait RecordBackend: Send + Sync {
    /// Reads the value stored under `key`.
    fn read(&self, key: &str) -> Result<Option<String>, BackendError>;

    /// Replaces the value under `key`.
    fn write(&self, key: &str, value: &str) -> Result<(), BackendError>;

    /// Removes `key`. Missing keys are not an error.
    fn remove(&self, key: &str) -> Result<(), BackendError>;

    /// Total quota in bytes.
    fn capacity_bytes(&self) -> u64;
}
