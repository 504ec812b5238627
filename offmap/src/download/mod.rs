//! Batched tile downloads.
//!
//! This module provides:
//! - [`TileFetcher`]: bounded, group-sequential fetching with all-or-nothing
//!   results (`fetcher`)
//! - [`DownloadTracker`]: the caller's `Idle | Downloading | Failed` state
//!   (`state`)
//!
//! # Architecture
//!
//! ```text
//! TileFetcher
//!     │
//!     ├── TileSource (trait)          one tile → bytes
//!     │       └── UrlTemplateProvider
//!     │
//!     └── groups of `concurrency` tiles, joined before the next group
//! ```

mod fetcher;
mod state;

pub use fetcher::{
    group_count, FetchConfig, TileFetcher, DEFAULT_CONCURRENCY, DEFAULT_GROUP_PAUSE,
    DEFAULT_TILE_TIMEOUT,
};
pub use state::{DownloadState, DownloadTracker, TrackerError};

use thiserror::Error;

use crate::coord::TileCoord;
use crate::provider::ProviderError;

/// A tile download failed; the whole batch is discarded.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FetchError {
    #[error("Failed to fetch tile {tile}: {source}")]
    Provider {
        tile: TileCoord,
        #[source]
        source: ProviderError,
    },

    #[error("Timed out after {timeout_ms}ms fetching tile {tile}")]
    Timeout { tile: TileCoord, timeout_ms: u64 },
}

impl FetchError {
    /// The tile that caused the failure.
    pub fn tile(&self) -> TileCoord {
        match self {
            FetchError::Provider { tile, .. } | FetchError::Timeout { tile, .. } => *tile,
        }
    }
}
