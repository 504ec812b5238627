//! Tile source trait and provider errors.

use std::future::Future;

use thiserror::Error;

use crate::coord::TileCoord;

/// Errors raised while retrieving a single tile.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProviderError {
    /// Transport failure or non-success status.
    #[error("HTTP error: {0}")]
    HttpError(String),

    /// The server answered 2xx with no body.
    #[error("Empty response for tile {0}")]
    EmptyResponse(TileCoord),

    /// Invalid tile URL template.
    #[error("Invalid URL template: {0}")]
    InvalidTemplate(String),

    /// The tile lies outside the grid for its zoom level.
    #[error("Tile {0} is outside the grid")]
    InvalidTile(TileCoord),
}

/// Asynchronous source of raw tile image bytes.
///
/// Implementations must be `Send + Sync` so a fetcher can be shared by the
/// application assembly.
pub trait TileSource: Send + Sync {
    /// Downloads the image bytes for one tile.
    fn fetch_tile(
        &self,
        tile: TileCoord,
    ) -> impl Future<Output = Result<Vec<u8>, ProviderError>> + Send;

    /// Human-readable source name for logs.
    fn name(&self) -> &str;
}
