//! File-system record backend.
//!
//! Each key is stored as `<directory>/<key>.json`. Writes go to a sibling
//! temporary file which is then renamed over the record, so an interrupted
//! or rejected write never leaves a torn record behind.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::store::traits::{charged_size, BackendError, RecordBackend, DEFAULT_CAPACITY_BYTES};

const RECORD_EXTENSION: &str = "json";

/// Record backend persisting one file per key.
pub struct FileBackend {
    directory: PathBuf,
    capacity_bytes: u64,
}

impl FileBackend {
    /// Opens (and creates if needed) a backend rooted at `directory`.
    pub fn open(directory: impl Into<PathBuf>, capacity_bytes: u64) -> Result<Self, BackendError> {
        let directory = directory.into();
        fs::create_dir_all(&directory)?;
        Ok(Self {
            directory,
            capacity_bytes,
        })
    }

    /// Opens a backend with the default quota.
    pub fn open_default(directory: impl Into<PathBuf>) -> Result<Self, BackendError> {
        Self::open(directory, DEFAULT_CAPACITY_BYTES)
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Path of the file holding `key`.
    pub fn record_path(&self, key: &str) -> PathBuf {
        let name: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.directory
            .join(format!("{}.{}", name, RECORD_EXTENSION))
    }

    /// Bytes charged by records other than `exclude`, counted the same way
    /// as the record being written.
    fn charged_by_others(&self, exclude: &Path) -> Result<u64, BackendError> {
        let mut total = 0;
        for entry in fs::read_dir(&self.directory)? {
            let path = entry?.path();
            if path == exclude
                || path.extension().and_then(|e| e.to_str()) != Some(RECORD_EXTENSION)
            {
                continue;
            }
            let key_len = path
                .file_stem()
                .map(|s| s.to_string_lossy().encode_utf16().count() as u64 * 2)
                .unwrap_or(0);
            total += key_len + charged_size(&fs::read_to_string(&path)?);
        }
        Ok(total)
    }
}

impl RecordBackend for FileBackend {
    fn read(&self, key: &str) -> Result<Option<String>, BackendError> {
        match fs::read_to_string(self.record_path(key)) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, key: &str, value: &str) -> Result<(), BackendError> {
        let path = self.record_path(key);

        let needed = self.charged_by_others(&path)? + charged_size(key) + charged_size(value);
        if needed > self.capacity_bytes {
            return Err(BackendError::QuotaExceeded {
                needed,
                capacity: self.capacity_bytes,
            });
        }

        let tmp = path.with_extension("json.tmp");
        let result = (|| -> io::Result<()> {
            let mut file = fs::File::create(&tmp)?;
            file.write_all(value.as_bytes())?;
            file.sync_all()?;
            fs::rename(&tmp, &path)
        })();

        if let Err(e) = result {
            let _ = fs::remove_file(&tmp);
            return Err(e.into());
        }

        debug!(path = %path.display(), bytes = value.len(), "Record written");
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), BackendError> {
        match fs::remove_file(self.record_path(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn capacity_bytes(&self) -> u64 {
        self.capacity_bytes
    }
}
