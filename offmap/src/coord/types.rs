//! Coordinate types and errors.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Maximum latitude representable in Web Mercator.
pub const MAX_LAT: f64 = 85.05112878;

/// Minimum latitude representable in Web Mercator.
pub const MIN_LAT: f64 = -85.05112878;

/// Minimum longitude.
pub const MIN_LON: f64 = -180.0;

/// Maximum longitude.
pub const MAX_LON: f64 = 180.0;

/// Minimum supported zoom level.
pub const MIN_ZOOM: u8 = 0;

/// Maximum supported zoom level.
///
/// At zoom 22 the grid is 4,194,304 tiles per side, which still fits in `u32`
/// pixel arithmetic for the 256-pixel tiles used by slippy-map servers.
pub const MAX_ZOOM: u8 = 22;

/// Errors produced while mapping geographic coordinates to tiles.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoordError {
    #[error("Invalid latitude: {0} (must be within ±{MAX_LAT})")]
    InvalidLatitude(f64),

    #[error("Invalid longitude: {0} (must be within ±180)")]
    InvalidLongitude(f64),

    #[error("Invalid zoom level: {0} (must be {MIN_ZOOM}-{MAX_ZOOM})")]
    InvalidZoom(u8),

    /// North/south or east/west edges are inverted or collapsed.
    #[error("Invalid bounds: {0}")]
    InvalidBounds(String),
}

/// A geographic bounding box in degrees.
///
/// Areas never cross the anti-meridian, so `east > west` always holds for a
/// valid box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoBounds {
    pub north: f64,
    pub south: f64,
    pub east: f64,
    pub west: f64,
}

impl GeoBounds {
    /// Creates validated bounds.
    pub fn new(north: f64, south: f64, east: f64, west: f64) -> Result<Self, CoordError> {
        let bounds = Self {
            north,
            south,
            east,
            west,
        };
        bounds.validate()?;
        Ok(bounds)
    }

    /// Checks edge ordering and projection limits.
    pub fn validate(&self) -> Result<(), CoordError> {
        for lat in [self.north, self.south] {
            if !lat.is_finite() || !(MIN_LAT..=MAX_LAT).contains(&lat) {
                return Err(CoordError::InvalidLatitude(lat));
            }
        }
        for lon in [self.east, self.west] {
            if !lon.is_finite() || !(MIN_LON..=MAX_LON).contains(&lon) {
                return Err(CoordError::InvalidLongitude(lon));
            }
        }
        if self.north <= self.south {
            return Err(CoordError::InvalidBounds(format!(
                "north ({}) must be greater than south ({})",
                self.north, self.south
            )));
        }
        if self.east <= self.west {
            return Err(CoordError::InvalidBounds(format!(
                "east ({}) must be greater than west ({})",
                self.east, self.west
            )));
        }
        Ok(())
    }

    /// Centre point as `(lat, lon)`.
    pub fn center(&self) -> (f64, f64) {
        (
            (self.north + self.south) / 2.0,
            (self.east + self.west) / 2.0,
        )
    }

    /// Latitude span in degrees.
    pub fn lat_span(&self) -> f64 {
        self.north - self.south
    }

    /// Longitude span in degrees.
    pub fn lon_span(&self) -> f64 {
        self.east - self.west
    }
}

/// Slippy-map tile address.
///
/// `x` is the column (west to east), `y` the row (north to south).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileCoord {
    pub x: u32,
    pub y: u32,
    pub z: u8,
}

impl TileCoord {
    pub fn new(x: u32, y: u32, z: u8) -> Self {
        Self { x, y, z }
    }

    /// Whether `z` is a supported zoom and `x`, `y` are inside its grid.
    pub fn is_valid(&self) -> bool {
        if self.z > MAX_ZOOM {
            return false;
        }
        let n = grid_size(self.z);
        u64::from(self.x) < n && u64::from(self.y) < n
    }
}

impl fmt::Display for TileCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.z, self.x, self.y)
    }
}

/// Number of tiles per side at `zoom`.
///
/// Saturates at `u64::MAX` for zooms that do not fit in a `u64` shift.
#[inline]
pub fn grid_size(zoom: u8) -> u64 {
    1u64.checked_shl(u32::from(zoom)).unwrap_or(u64::MAX)
}

/// Inclusive rectangle of tile indices at one zoom level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileRange {
    pub min_x: u32,
    pub max_x: u32,
    pub min_y: u32,
    pub max_y: u32,
    pub zoom: u8,
}

impl TileRange {
    /// Number of columns.
    pub fn width(&self) -> u32 {
        self.max_x - self.min_x + 1
    }

    /// Number of rows.
    pub fn height(&self) -> u32 {
        self.max_y - self.min_y + 1
    }

    /// Total number of tiles in the range.
    pub fn len(&self) -> usize {
        self.width() as usize * self.height() as usize
    }

    /// A range always holds at least one tile.
    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn contains(&self, tile: &TileCoord) -> bool {
        tile.z == self.zoom
            && (self.min_x..=self.max_x).contains(&tile.x)
            && (self.min_y..=self.max_y).contains(&tile.y)
    }

    /// Iterates tiles row by row, west to east within each row.
    pub fn iter(&self) -> TileRangeIter {
        TileRangeIter {
            range: *self,
            next_x: self.min_x,
            next_y: self.min_y,
            done: false,
        }
    }

    /// Smallest range covering every coordinate in `tiles` at `zoom`.
    ///
    /// Tiles at other zoom levels are ignored. Returns `None` when nothing
    /// matches.
    pub fn covering<'a, I>(tiles: I, zoom: u8) -> Option<Self>
    where
        I: IntoIterator<Item = &'a TileCoord>,
    {
        let mut range: Option<Self> = None;
        for tile in tiles.into_iter().filter(|t| t.z == zoom) {
            range = Some(match range {
                None => Self {
                    min_x: tile.x,
                    max_x: tile.x,
                    min_y: tile.y,
                    max_y: tile.y,
                    zoom,
                },
                Some(r) => Self {
                    min_x: r.min_x.min(tile.x),
                    max_x: r.max_x.max(tile.x),
                    min_y: r.min_y.min(tile.y),
                    max_y: r.max_y.max(tile.y),
                    zoom,
                },
            });
        }
        range
    }
}

impl<'a> IntoIterator for &'a TileRange {
    type Item = TileCoord;
    type IntoIter = TileRangeIter;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Row-major iterator over a [`TileRange`].
#[derive(Debug, Clone)]
pub struct TileRangeIter {
    range: TileRange,
    next_x: u32,
    next_y: u32,
    done: bool,
}

impl Iterator for TileRangeIter {
    type Item = TileCoord;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let tile = TileCoord::new(self.next_x, self.next_y, self.range.zoom);

        if self.next_x == self.range.max_x {
            if self.next_y == self.range.max_y {
                self.done = true;
            } else {
                self.next_x = self.range.min_x;
                self.next_y += 1;
            }
        } else {
            self.next_x += 1;
        }

        Some(tile)
    }
}
