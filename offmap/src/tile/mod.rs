//! Downloaded tile records.
//!
//! A [`Tile`] pairs a grid address with its image payload encoded as a
//! base64 `data:` URI, which keeps the record JSON-safe and usable directly
//! as an image source by the map renderer.

mod data_uri;

pub use data_uri::{decode_data_uri, encode_data_uri, mime_for, DataUriError};

use serde::{Deserialize, Serialize};

use crate::coord::TileCoord;

/// One encoded tile belonging to a stored map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tile {
    pub x: u32,
    pub y: u32,
    pub z: u8,
    /// Self-describing image payload, e.g. `data:image/png;base64,...`.
    pub data: String,
}

impl Tile {
    /// Encodes raw image bytes into a tile record.
    pub fn from_bytes(coord: TileCoord, bytes: &[u8]) -> Self {
        Self {
            x: coord.x,
            y: coord.y,
            z: coord.z,
            data: encode_data_uri(bytes),
        }
    }

    pub fn coord(&self) -> TileCoord {
        TileCoord::new(self.x, self.y, self.z)
    }

    /// Decodes the payload back into raw image bytes.
    pub fn image_bytes(&self) -> Result<Vec<u8>, DataUriError> {
        decode_data_uri(&self.data).map(|(_, bytes)| bytes)
    }
}
