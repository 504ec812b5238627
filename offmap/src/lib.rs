//! offmap - Offline map tiles for named areas
//!
//! This library downloads the raster tiles covering a map area, keeps them in
//! a size-limited local store, and composites them back into a single image
//! for offline viewing.
//!
//! # Modules
//!
//! - [`coord`]: bounding box → slippy-map tile range
//! - [`provider`]: tile URL templates and HTTP transport
//! - [`download`]: bounded, all-or-nothing batch fetching
//! - [`store`]: the map cache store and its backends
//! - [`compositor`]: stored tiles → one raster
//! - [`catalog`], [`auth`], [`assistant`]: areas, sign-in gate, chat helper
//! - [`app`]: everything wired together as [`app::OfflineMaps`]

pub mod app;
pub mod assistant;
pub mod auth;
pub mod catalog;
pub mod compositor;
pub mod config;
pub mod coord;
pub mod download;
pub mod logging;
pub mod provider;
pub mod store;
pub mod tile;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
