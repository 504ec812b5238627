//! Application assembly.
//!
//! [`OfflineMaps`] owns the area catalog, the tile fetcher, the map store,
//! the compositor and the sign-in gate, and exposes the user-level
//! operations: download an area, list and delete stored maps, render a map
//! and ask the assistant about an area.
//!
//! # Architecture
//!
//! ```text
//! OfflineMaps
//!     ├── Catalog          which areas exist
//!     ├── AuthGate         may the user download?
//!     ├── TileFetcher      tile_range → tiles (all or nothing)
//!     ├── MapStore         upsert / list / delete / clear
//!     └── TileCompositor   stored map → raster
//! ```
//!
//! # Example
//!
//! ```ignore
//! use offmap::app::{AppConfig, OfflineMaps};
//! use offmap::config::ConfigFile;
//!
//! let config = AppConfig::from_config_file(&ConfigFile::load()?);
//! let maps = OfflineMaps::from_config(&config)?;
//! let report = maps.download_area("mission", |p| println!("{:.0}%", p * 100.0)).await?;
//! ```

mod config;
mod error;
mod maps;

pub use config::AppConfig;
pub use error::AppError;
pub use maps::{ConfiguredMaps, DownloadReport, OfflineMaps};
