//! Tile compositor.
//!
//! Rebuilds a single raster from a stored map's tiles. Tiles are decoded in
//! parallel on the rayon pool and drawn sequentially onto one RGBA canvas.
//! A tile that cannot be decoded is skipped and reported, never fatal.

mod error;

pub use error::{CompositeError, DecodeError, SkippedTile};

use std::fmt;
use std::io::Cursor;
use std::str::FromStr;

use image::imageops::{self, FilterType};
use image::{ImageFormat, RgbaImage};
use rayon::prelude::*;
use thiserror::Error;
use tracing::{debug, warn};

use crate::coord::{GeoBounds, TileCoord, TileRange, MAX_ZOOM};
use crate::store::StoredMap;
use crate::tile::{encode_data_uri, Tile};

/// Edge length of a slippy-map tile in pixels.
pub const DEFAULT_TILE_SIZE: u32 = 256;

/// Largest canvas side the compositor will allocate.
pub const DEFAULT_MAX_CANVAS_PX: u32 = 16384;

/// Which part of the tile grid the canvas covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CanvasExtent {
    /// The whole `2^zoom` grid; tile `(x, y)` lands at `(x, y) * tile_size`.
    #[default]
    World,
    /// Only the bounding range of the stored tiles.
    Cropped,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown canvas extent '{0}' (expected 'world' or 'cropped')")]
pub struct ParseExtentError(String);

impl FromStr for CanvasExtent {
    type Err = ParseExtentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "world" => Ok(Self::World),
            "cropped" => Ok(Self::Cropped),
            other => Err(ParseExtentError(other.to_string())),
        }
    }
}

impl fmt::Display for CanvasExtent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::World => write!(f, "world"),
            Self::Cropped => write!(f, "cropped"),
        }
    }
}

/// Compositor settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompositorConfig {
    pub tile_size: u32,
    pub extent: CanvasExtent,
    pub max_canvas_px: u32,
}

impl Default for CompositorConfig {
    fn default() -> Self {
        Self {
            tile_size: DEFAULT_TILE_SIZE,
            extent: CanvasExtent::default(),
            max_canvas_px: DEFAULT_MAX_CANVAS_PX,
        }
    }
}

impl CompositorConfig {
    pub fn with_extent(mut self, extent: CanvasExtent) -> Self {
        self.extent = extent;
        self
    }

    /// Sets the tile size; zero is raised to one pixel.
    pub fn with_tile_size(mut self, tile_size: u32) -> Self {
        self.tile_size = tile_size.max(1);
        self
    }

    pub fn with_max_canvas_px(mut self, max_canvas_px: u32) -> Self {
        self.max_canvas_px = max_canvas_px;
        self
    }
}

/// A rendered map.
#[derive(Debug)]
pub struct CompositeImage {
    pub image: RgbaImage,
    /// Geographic extent of the canvas edges.
    pub anchor: GeoBounds,
    /// Tile drawn at the canvas origin.
    pub origin: TileCoord,
    /// Tiles left transparent.
    pub skipped: Vec<SkippedTile>,
    /// Number of tiles drawn.
    pub drawn: usize,
}

impl CompositeImage {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Encodes the canvas as PNG.
    pub fn encode_png(&self) -> Result<Vec<u8>, CompositeError> {
        let mut out = Cursor::new(Vec::new());
        self.image.write_to(&mut out, ImageFormat::Png)?;
        Ok(out.into_inner())
    }

    /// Encodes the canvas as a `data:image/png;base64,...` URI.
    pub fn to_data_uri(&self) -> Result<String, CompositeError> {
        Ok(encode_data_uri(&self.encode_png()?))
    }
}

/// Draws stored maps onto a canvas.
#[derive(Debug, Clone, Default)]
pub struct TileCompositor {
    config: CompositorConfig,
}

impl TileCompositor {
    pub fn new(config: CompositorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CompositorConfig {
        &self.config
    }

    /// Composites every tile of `map`.
    ///
    /// # Errors
    ///
    /// [`CompositeError::CanvasTooLarge`] when either side would exceed
    /// `max_canvas_px`, [`CompositeError::NoTiles`] for a cropped extent with
    /// nothing to crop to. Individual tile failures are reported in
    /// [`CompositeImage::skipped`] instead.
    pub fn composite(&self, map: &StoredMap) -> Result<CompositeImage, CompositeError> {
        let tile_size = self.config.tile_size.max(1);
        let range = self.canvas_range(map)?;

        let width = u64::from(range.width()) * u64::from(tile_size);
        let height = u64::from(range.height()) * u64::from(tile_size);
        self.check_canvas(width, height)?;

        let decoded: Vec<(TileCoord, Result<RgbaImage, DecodeError>)> = map
            .tiles
            .par_iter()
            .map(|tile| (tile.coord(), decode_tile(tile, &range, tile_size)))
            .collect();

        // Both sides were checked against a u32 limit above.
        let mut canvas = RgbaImage::new(width as u32, height as u32);
        let mut skipped = Vec::new();
        let mut drawn = 0;

        for (coord, result) in decoded {
            match result {
                Ok(image) => {
                    let px = i64::from(coord.x - range.min_x) * i64::from(tile_size);
                    let py = i64::from(coord.y - range.min_y) * i64::from(tile_size);
                    imageops::replace(&mut canvas, &image, px, py);
                    drawn += 1;
                }
                Err(reason) => {
                    warn!(map = %map.id, tile = %coord, error = %reason, "Skipping undecodable tile");
                    skipped.push(SkippedTile {
                        tile: coord,
                        reason,
                    });
                }
            }
        }

        debug!(
            map = %map.id,
            width,
            height,
            drawn,
            skipped = skipped.len(),
            "Composited map"
        );

        Ok(CompositeImage {
            image: canvas,
            anchor: range.geo_bounds(),
            origin: TileCoord::new(range.min_x, range.min_y, range.zoom),
            skipped,
            drawn,
        })
    }

    fn canvas_range(&self, map: &StoredMap) -> Result<TileRange, CompositeError> {
        match self.config.extent {
            CanvasExtent::World => {
                if map.zoom > MAX_ZOOM {
                    return Err(CompositeError::CanvasTooLarge {
                        width: u64::MAX,
                        height: u64::MAX,
                        limit: self.config.max_canvas_px,
                    });
                }
                let last = (crate::coord::grid_size(map.zoom) - 1) as u32;
                Ok(TileRange {
                    min_x: 0,
                    max_x: last,
                    min_y: 0,
                    max_y: last,
                    zoom: map.zoom,
                })
            }
            CanvasExtent::Cropped => {
                let valid: Vec<TileCoord> = map
                    .tiles
                    .iter()
                    .map(Tile::coord)
                    .filter(|t| t.z == map.zoom && t.is_valid())
                    .collect();
                TileRange::covering(&valid, map.zoom).ok_or(CompositeError::NoTiles(map.zoom))
            }
        }
    }

    fn check_canvas(&self, width: u64, height: u64) -> Result<(), CompositeError> {
        let limit = u64::from(self.config.max_canvas_px);
        if width > limit || height > limit {
            return Err(CompositeError::CanvasTooLarge {
                width,
                height,
                limit: self.config.max_canvas_px,
            });
        }
        Ok(())
    }
}

/// Decodes one tile and scales it to `tile_size` if needed.
fn decode_tile(tile: &Tile, range: &TileRange, tile_size: u32) -> Result<RgbaImage, DecodeError> {
    if tile.z != range.zoom {
        return Err(DecodeError::WrongZoom {
            expected: range.zoom,
            actual: tile.z,
        });
    }
    if !range.contains(&tile.coord()) {
        return Err(DecodeError::OutsideCanvas);
    }

    let bytes = tile.image_bytes()?;
    let image = image::load_from_memory(&bytes)?.to_rgba8();
    if image.dimensions() == (tile_size, tile_size) {
        Ok(image)
    } else {
        Ok(imageops::resize(&image, tile_size, tile_size, FilterType::Triangle))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::sample_png;
    use crate::store::sample_map;
    use image::Rgba;

    const RED: [u8; 4] = [255, 0, 0, 255];
    const BLUE: [u8; 4] = [0, 0, 255, 255];
    const CLEAR: [u8; 4] = [0, 0, 0, 0];

    fn png_tile(x: u32, y: u32, z: u8, size: u32, rgba: [u8; 4]) -> Tile {
        Tile::from_bytes(TileCoord::new(x, y, z), &sample_png(size, size, rgba))
    }

    fn map_with(zoom: u8, tiles: Vec<Tile>) -> StoredMap {
        let mut map = sample_map("test");
        map.zoom = zoom;
        map.tiles = tiles;
        map
    }

    fn compositor(extent: CanvasExtent) -> TileCompositor {
        TileCompositor::new(
            CompositorConfig::default()
                .with_extent(extent)
                .with_tile_size(4),
        )
    }

    #[test]
    fn test_world_extent_places_tiles_by_grid_position() {
        let map = map_with(1, vec![png_tile(0, 0, 1, 4, RED), png_tile(1, 1, 1, 4, BLUE)]);

        let out = compositor(CanvasExtent::World).composite(&map).unwrap();

        assert_eq!((out.width(), out.height()), (8, 8));
        assert_eq!(out.image.get_pixel(0, 0), &Rgba(RED));
        assert_eq!(out.image.get_pixel(3, 3), &Rgba(RED));
        assert_eq!(out.image.get_pixel(4, 4), &Rgba(BLUE));
        assert_eq!(out.image.get_pixel(7, 7), &Rgba(BLUE));
        assert_eq!(out.image.get_pixel(4, 0), &Rgba(CLEAR));
        assert_eq!(out.drawn, 2);
        assert!(out.skipped.is_empty());
        assert_eq!(out.origin, TileCoord::new(0, 0, 1));
    }

    #[test]
    fn test_cropped_extent_starts_at_range_origin() {
        let map = map_with(4, vec![png_tile(5, 3, 4, 4, RED), png_tile(6, 3, 4, 4, BLUE)]);

        let out = compositor(CanvasExtent::Cropped).composite(&map).unwrap();

        assert_eq!((out.width(), out.height()), (8, 4));
        assert_eq!(out.image.get_pixel(0, 0), &Rgba(RED));
        assert_eq!(out.image.get_pixel(4, 0), &Rgba(BLUE));
        assert_eq!(out.origin, TileCoord::new(5, 3, 4));

        let range = TileRange {
            min_x: 5,
            max_x: 6,
            min_y: 3,
            max_y: 3,
            zoom: 4,
        };
        assert_eq!(out.anchor, range.geo_bounds());
    }

    #[test]
    fn test_bad_tile_is_skipped_not_fatal() {
        let mut broken = png_tile(1, 0, 1, 4, RED);
        broken.data = "data:image/png;base64,bm90IGFuIGltYWdl".to_string();
        let map = map_with(1, vec![png_tile(0, 0, 1, 4, BLUE), broken]);

        let out = compositor(CanvasExtent::World).composite(&map).unwrap();

        assert_eq!(out.drawn, 1);
        assert_eq!(out.skipped.len(), 1);
        assert_eq!(out.skipped[0].tile, TileCoord::new(1, 0, 1));
        assert!(matches!(out.skipped[0].reason, DecodeError::Image(_)));
        assert_eq!(out.image.get_pixel(4, 0), &Rgba(CLEAR));
        assert_eq!(out.image.get_pixel(0, 0), &Rgba(BLUE));
    }

    #[test]
    fn test_non_data_uri_is_skipped() {
        let mut broken = png_tile(0, 0, 1, 4, RED);
        broken.data = "https://tile.openstreetmap.org/1/0/0.png".to_string();
        let map = map_with(1, vec![broken]);

        let out = compositor(CanvasExtent::World).composite(&map).unwrap();
        assert!(matches!(out.skipped[0].reason, DecodeError::DataUri(_)));
    }

    #[test]
    fn test_tile_at_other_zoom_is_skipped() {
        let map = map_with(1, vec![png_tile(0, 0, 1, 4, RED), png_tile(0, 0, 2, 4, BLUE)]);

        let out = compositor(CanvasExtent::World).composite(&map).unwrap();

        assert_eq!(out.drawn, 1);
        assert!(matches!(
            out.skipped[0].reason,
            DecodeError::WrongZoom {
                expected: 1,
                actual: 2
            }
        ));
    }

    #[test]
    fn test_corrupt_zoom_tile_is_skipped() {
        let map = map_with(
            4,
            vec![png_tile(5, 3, 4, 4, RED), png_tile(0, 0, 70, 4, BLUE), png_tile(6, 3, 4, 4, BLUE)],
        );

        let out = compositor(CanvasExtent::Cropped).composite(&map).unwrap();

        assert_eq!((out.width(), out.height()), (8, 4));
        assert_eq!(out.drawn, 2);
        assert_eq!(out.skipped.len(), 1);
        assert_eq!(out.skipped[0].tile, TileCoord::new(0, 0, 70));
        assert!(matches!(
            out.skipped[0].reason,
            DecodeError::WrongZoom {
                expected: 4,
                actual: 70
            }
        ));
        assert_eq!(out.image.get_pixel(0, 0), &Rgba(RED));
        assert_eq!(out.image.get_pixel(4, 0), &Rgba(BLUE));

        let out = compositor(CanvasExtent::World).composite(&map).unwrap();
        assert_eq!(out.drawn, 2);
        assert_eq!(out.skipped.len(), 1);
    }

    #[test]
    fn test_tile_outside_grid_is_skipped() {
        let map = map_with(1, vec![png_tile(5, 0, 1, 4, RED)]);

        let out = compositor(CanvasExtent::World).composite(&map).unwrap();
        assert!(matches!(out.skipped[0].reason, DecodeError::OutsideCanvas));
    }

    #[test]
    fn test_oversized_tiles_are_scaled() {
        let map = map_with(0, vec![png_tile(0, 0, 0, 16, RED)]);

        let out = compositor(CanvasExtent::World).composite(&map).unwrap();

        assert_eq!((out.width(), out.height()), (4, 4));
        assert_eq!(out.image.get_pixel(2, 2), &Rgba(RED));
    }

    #[test]
    fn test_world_canvas_at_high_zoom_is_refused() {
        let map = map_with(15, vec![png_tile(5241, 12663, 15, 4, RED)]);
        let compositor = TileCompositor::new(CompositorConfig::default());

        let result = compositor.composite(&map);
        assert!(matches!(
            result,
            Err(CompositeError::CanvasTooLarge {
                width: 8388608,
                height: 8388608,
                limit: DEFAULT_MAX_CANVAS_PX
            })
        ));
    }

    #[test]
    fn test_cropped_canvas_at_high_zoom_fits() {
        let map = map_with(
            15,
            vec![
                png_tile(5241, 12663, 15, 256, RED),
                png_tile(5243, 12666, 15, 256, BLUE),
            ],
        );
        let compositor =
            TileCompositor::new(CompositorConfig::default().with_extent(CanvasExtent::Cropped));

        let out = compositor.composite(&map).unwrap();
        assert_eq!((out.width(), out.height()), (768, 1024));
        assert_eq!(out.image.get_pixel(767, 1023), &Rgba(BLUE));
    }

    #[test]
    fn test_cropped_without_tiles_fails() {
        let map = map_with(15, Vec::new());

        let result = compositor(CanvasExtent::Cropped).composite(&map);
        assert!(matches!(result, Err(CompositeError::NoTiles(15))));
    }

    #[test]
    fn test_world_without_tiles_is_blank() {
        let map = map_with(1, Vec::new());

        let out = compositor(CanvasExtent::World).composite(&map).unwrap();
        assert_eq!(out.drawn, 0);
        assert!(out.image.pixels().all(|p| p == &Rgba(CLEAR)));
    }

    #[test]
    fn test_data_uri_output_decodes() {
        let map = map_with(1, vec![png_tile(0, 0, 1, 4, RED)]);
        let out = compositor(CanvasExtent::World).composite(&map).unwrap();

        let uri = out.to_data_uri().unwrap();
        assert!(uri.starts_with("data:image/png;base64,"));

        let (_, bytes) = crate::tile::decode_data_uri(&uri).unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (8, 8));
    }

    #[test]
    fn test_extent_parsing() {
        assert_eq!("world".parse::<CanvasExtent>(), Ok(CanvasExtent::World));
        assert_eq!(" Cropped ".parse::<CanvasExtent>(), Ok(CanvasExtent::Cropped));
        assert!("tiled".parse::<CanvasExtent>().is_err());
        assert_eq!(CanvasExtent::Cropped.to_string(), "cropped");
    }
}
