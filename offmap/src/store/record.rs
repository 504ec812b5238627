//! Persisted map records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::MapArea;
use crate::coord::{GeoBounds, TileRange};
use crate::tile::Tile;

/// Record format version written with every new map.
pub const FORMAT_VERSION: &str = "1.0.0";

/// Offline data for one area: its metadata plus every downloaded tile.
///
/// Serialized with camelCase field names; the JSON form is the persistence
/// format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredMap {
    pub id: String,
    pub name: String,
    pub bounds: GeoBounds,
    pub description: String,
    pub tiles: Vec<Tile>,
    pub downloaded_at: DateTime<Utc>,
    pub zoom: u8,
    pub version: String,
}

impl StoredMap {
    /// Builds a fresh record for `area` stamped with the current time.
    pub fn from_area(area: &MapArea, zoom: u8, tiles: Vec<Tile>) -> Self {
        Self {
            id: area.id.clone(),
            name: area.name.clone(),
            bounds: area.bounds,
            description: area.description.clone(),
            tiles,
            downloaded_at: Utc::now(),
            zoom,
            version: FORMAT_VERSION.to_string(),
        }
    }

    pub fn tile_count(&self) -> usize {
        self.tiles.len()
    }

    /// Bounding range of the tiles stored at the record's zoom.
    pub fn tile_range(&self) -> Option<TileRange> {
        let coords: Vec<_> = self.tiles.iter().map(Tile::coord).collect();
        TileRange::covering(&coords, self.zoom)
    }

    /// Total characters of encoded tile payloads.
    pub fn payload_len(&self) -> usize {
        self.tiles.iter().map(|t| t.data.len()).sum()
    }
}
