//! Compositor error types.

use thiserror::Error;

use crate::coord::TileCoord;
use crate::tile::DataUriError;

/// Why a single tile could not be drawn.
///
/// Contained per tile: the cell stays transparent and the composite carries
/// on.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("Bad data URI: {0}")]
    DataUri(#[from] DataUriError),

    #[error("Image decode failed: {0}")]
    Image(#[from] image::ImageError),

    #[error("Tile is at zoom {actual}, map is at zoom {expected}")]
    WrongZoom { expected: u8, actual: u8 },

    #[error("Tile falls outside the canvas")]
    OutsideCanvas,
}

/// A tile left out of a composite and the reason.
#[derive(Debug)]
pub struct SkippedTile {
    pub tile: TileCoord,
    pub reason: DecodeError,
}

/// Canvas-level failures.
#[derive(Debug, Error)]
pub enum CompositeError {
    #[error("Canvas {width}×{height} exceeds the {limit}px limit")]
    CanvasTooLarge { width: u64, height: u64, limit: u32 },

    #[error("Map has no tiles at zoom {0}")]
    NoTiles(u8),

    #[error("PNG encoding failed: {0}")]
    Encode(#[from] image::ImageError),
}
