//! Coordinate conversion module
//!
//! Maps geographic bounding boxes onto the Web Mercator slippy-map grid used
//! by raster tile servers.

mod types;

pub use types::{
    grid_size, CoordError, GeoBounds, TileCoord, TileRange, TileRangeIter, MAX_LAT, MAX_LON,
    MAX_ZOOM, MIN_LAT, MIN_LON, MIN_ZOOM,
};

use std::f64::consts::PI;

/// Converts a longitude to a tile column, clamped to the grid.
#[inline]
fn lon_to_col(lon: f64, zoom: u8) -> u32 {
    let n = grid_size(zoom) as f64;
    let col = ((lon + 180.0) / 360.0 * n).floor();
    clamp_index(col, zoom)
}

/// Converts a latitude to a tile row, clamped to the grid.
#[inline]
fn lat_to_row(lat: f64, zoom: u8) -> u32 {
    let n = grid_size(zoom) as f64;
    let lat_rad = lat * PI / 180.0;
    let row = ((1.0 - (lat_rad.tan() + 1.0 / lat_rad.cos()).ln() / PI) / 2.0 * n).floor();
    clamp_index(row, zoom)
}

/// `lon = 180` and `lat = MIN_LAT` land exactly on the far grid edge.
#[inline]
fn clamp_index(value: f64, zoom: u8) -> u32 {
    let max = (grid_size(zoom) - 1) as f64;
    value.clamp(0.0, max) as u32
}

/// Computes the inclusive tile range covering `bounds` at `zoom`.
///
/// The northern edge maps to the smaller row because rows grow southward.
///
/// # Errors
///
/// Returns [`CoordError`] when the bounds are inverted, outside the Web
/// Mercator range, or the zoom exceeds [`MAX_ZOOM`].
pub fn tile_range(bounds: &GeoBounds, zoom: u8) -> Result<TileRange, CoordError> {
    if zoom > MAX_ZOOM {
        return Err(CoordError::InvalidZoom(zoom));
    }
    bounds.validate()?;

    Ok(TileRange {
        min_x: lon_to_col(bounds.west, zoom),
        max_x: lon_to_col(bounds.east, zoom),
        min_y: lat_to_row(bounds.north, zoom),
        max_y: lat_to_row(bounds.south, zoom),
        zoom,
    })
}

/// Converts a single point to the tile containing it.
pub fn to_tile_coords(lat: f64, lon: f64, zoom: u8) -> Result<TileCoord, CoordError> {
    if !(MIN_LAT..=MAX_LAT).contains(&lat) {
        return Err(CoordError::InvalidLatitude(lat));
    }
    if !(MIN_LON..=MAX_LON).contains(&lon) {
        return Err(CoordError::InvalidLongitude(lon));
    }
    if zoom > MAX_ZOOM {
        return Err(CoordError::InvalidZoom(zoom));
    }

    Ok(TileCoord {
        x: lon_to_col(lon, zoom),
        y: lat_to_row(lat, zoom),
        z: zoom,
    })
}

/// Returns the latitude/longitude of a tile's northwest corner.
#[inline]
pub fn tile_to_lat_lon(tile: &TileCoord) -> (f64, f64) {
    grid_corner(u64::from(tile.x), u64::from(tile.y), tile.z)
}

/// North-west corner of grid vertex `(x, y)`; accepts `x == 2^z`.
fn grid_corner(x: u64, y: u64, zoom: u8) -> (f64, f64) {
    let n = grid_size(zoom) as f64;
    let lon = x as f64 / n * 360.0 - 180.0;
    let lat_rad = (PI * (1.0 - 2.0 * y as f64 / n)).sinh().atan();
    (lat_rad * 180.0 / PI, lon)
}

impl TileRange {
    /// Geographic extent covered by every tile of the range.
    ///
    /// This is slightly larger than the bounds the range was computed from,
    /// since edge tiles overhang the requested box.
    pub fn geo_bounds(&self) -> GeoBounds {
        let (north, west) = grid_corner(u64::from(self.min_x), u64::from(self.min_y), self.zoom);
        let (south, east) = grid_corner(
            u64::from(self.max_x) + 1,
            u64::from(self.max_y) + 1,
            self.zoom,
        );
        GeoBounds {
            north,
            south,
            east,
            west,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn downtown() -> GeoBounds {
        GeoBounds::new(37.79, 37.77, -122.39, -122.42).unwrap()
    }

    #[test]
    fn test_downtown_range_at_zoom_15() {
        let range = tile_range(&downtown(), 15).unwrap();

        assert_eq!(range.min_x, 5241);
        assert_eq!(range.max_x, 5243);
        assert_eq!(range.min_y, 12663);
        assert_eq!(range.max_y, 12666);
        assert_eq!(range.zoom, 15);
        assert_eq!(range.len(), 12);
    }

    #[test]
    fn test_north_maps_to_smaller_row() {
        let range = tile_range(&downtown(), 15).unwrap();
        assert!(range.min_y < range.max_y);
    }

    #[test]
    fn test_range_iteration_is_row_major() {
        let range = tile_range(&downtown(), 15).unwrap();
        let tiles: Vec<_> = range.iter().collect();

        assert_eq!(tiles.len(), range.len());
        assert_eq!(tiles[0], TileCoord::new(5241, 12663, 15));
        assert_eq!(tiles[1], TileCoord::new(5242, 12663, 15));
        assert_eq!(tiles[3], TileCoord::new(5241, 12664, 15));
        assert_eq!(*tiles.last().unwrap(), TileCoord::new(5243, 12666, 15));
    }

    #[test]
    fn test_single_tile_range_yields_once() {
        let range = TileRange {
            min_x: 3,
            max_x: 3,
            min_y: 7,
            max_y: 7,
            zoom: 4,
        };
        let tiles: Vec<_> = range.iter().collect();
        assert_eq!(tiles, vec![TileCoord::new(3, 7, 4)]);
    }

    #[test]
    fn test_inverted_bounds_rejected() {
        let bounds = GeoBounds {
            north: 37.77,
            south: 37.79,
            east: -122.39,
            west: -122.42,
        };
        let result = tile_range(&bounds, 15);
        assert!(matches!(result, Err(CoordError::InvalidBounds(_))));

        let bounds = GeoBounds {
            north: 37.79,
            south: 37.77,
            east: -122.42,
            west: -122.39,
        };
        assert!(matches!(
            tile_range(&bounds, 15),
            Err(CoordError::InvalidBounds(_))
        ));
    }

    #[test]
    fn test_polar_latitude_rejected() {
        let result = GeoBounds::new(89.0, 80.0, 10.0, 0.0);
        assert!(matches!(result, Err(CoordError::InvalidLatitude(_))));
    }

    #[test]
    fn test_nan_rejected() {
        let result = GeoBounds::new(f64::NAN, 10.0, 10.0, 0.0);
        assert!(result.is_err());
    }

    #[test]
    fn test_zoom_above_max_rejected() {
        let result = tile_range(&downtown(), MAX_ZOOM + 1);
        assert_eq!(result, Err(CoordError::InvalidZoom(MAX_ZOOM + 1)));
    }

    #[test]
    fn test_world_edge_is_clamped() {
        let bounds = GeoBounds::new(MAX_LAT, MIN_LAT, 180.0, -180.0).unwrap();
        let range = tile_range(&bounds, 3).unwrap();

        assert_eq!(range.min_x, 0);
        assert_eq!(range.max_x, 7);
        assert_eq!(range.min_y, 0);
        assert_eq!(range.max_y, 7);
    }

    #[test]
    fn test_zoom_zero_is_single_tile() {
        let range = tile_range(&downtown(), 0).unwrap();
        assert_eq!(range.len(), 1);
        assert_eq!(range.iter().next(), Some(TileCoord::new(0, 0, 0)));
    }

    #[test]
    fn test_to_tile_coords_matches_range_corner() {
        let tile = to_tile_coords(37.79, -122.42, 15).unwrap();
        assert_eq!(tile, TileCoord::new(5241, 12663, 15));
    }

    #[test]
    fn test_range_geo_bounds_contains_source() {
        let bounds = downtown();
        let covered = tile_range(&bounds, 15).unwrap().geo_bounds();

        assert!(covered.north >= bounds.north);
        assert!(covered.south <= bounds.south);
        assert!(covered.east >= bounds.east);
        assert!(covered.west <= bounds.west);
    }

    #[test]
    fn test_covering_ignores_other_zooms() {
        let tiles = [
            TileCoord::new(4, 9, 5),
            TileCoord::new(2, 11, 5),
            TileCoord::new(100, 100, 9),
        ];
        let range = TileRange::covering(&tiles, 5).unwrap();

        assert_eq!((range.min_x, range.max_x), (2, 4));
        assert_eq!((range.min_y, range.max_y), (9, 11));
        assert!(TileRange::covering(&tiles, 6).is_none());
    }

    #[test]
    fn test_unsupported_zoom_is_never_valid() {
        assert!(!TileCoord::new(0, 0, MAX_ZOOM + 1).is_valid());
        assert!(!TileCoord::new(0, 0, 70).is_valid());
        assert!(!TileCoord::new(0, 0, u8::MAX).is_valid());
        assert!(TileCoord::new(0, 0, MAX_ZOOM).is_valid());
    }

    #[test]
    fn test_grid_size_saturates() {
        assert_eq!(grid_size(0), 1);
        assert_eq!(grid_size(15), 32768);
        assert_eq!(grid_size(63), 1u64 << 63);
        assert_eq!(grid_size(64), u64::MAX);
        assert_eq!(grid_size(u8::MAX), u64::MAX);

        let (lat, lon) = tile_to_lat_lon(&TileCoord::new(0, 0, 70));
        assert!(lat.is_finite());
        assert_eq!(lon, -180.0);
    }

    #[test]
    fn test_tile_to_lat_lon_at_origin() {
        let (lat, lon) = tile_to_lat_lon(&TileCoord::new(0, 0, 0));
        assert!((lat - MAX_LAT).abs() < 1e-6);
        assert_eq!(lon, -180.0);
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        fn bounds_strategy() -> impl Strategy<Value = GeoBounds> {
            (
                -85.0..85.0_f64,
                0.0001..5.0_f64,
                -180.0..179.0_f64,
                0.0001..5.0_f64,
            )
                .prop_map(|(south, lat_span, west, lon_span)| GeoBounds {
                    north: (south + lat_span).min(MAX_LAT),
                    south,
                    east: (west + lon_span).min(MAX_LON),
                    west,
                })
        }

        proptest! {
            #[test]
            fn test_range_ordered_and_in_grid(
                bounds in bounds_strategy(),
                zoom in 0u8..=MAX_ZOOM
            ) {
                let range = tile_range(&bounds, zoom)?;
                let n = grid_size(zoom);

                prop_assert!(range.min_x <= range.max_x);
                prop_assert!(range.min_y <= range.max_y);
                for value in [range.min_x, range.max_x, range.min_y, range.max_y] {
                    prop_assert!(u64::from(value) < n, "{} outside grid of {} at zoom {}", value, n, zoom);
                }
            }

            #[test]
            fn test_every_iterated_tile_is_valid(
                bounds in bounds_strategy(),
                zoom in 0u8..=8
            ) {
                let range = tile_range(&bounds, zoom)?;
                let mut count = 0usize;
                for tile in range.iter() {
                    prop_assert!(tile.is_valid());
                    prop_assert!(range.contains(&tile));
                    count += 1;
                }
                prop_assert_eq!(count, range.len());
            }

            #[test]
            fn test_corners_map_inside_range(
                bounds in bounds_strategy(),
                zoom in 0u8..=18
            ) {
                let range = tile_range(&bounds, zoom)?;
                let nw = to_tile_coords(bounds.north, bounds.west, zoom)?;
                let se = to_tile_coords(bounds.south, bounds.east, zoom)?;

                prop_assert!(range.contains(&nw));
                prop_assert!(range.contains(&se));
            }
        }
    }
}
