//! Area catalog.
//!
//! The read-only list of purchasable map areas, plus GeoJSON shapes handed
//! to the map renderer for area outlines and landmark markers.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

use crate::coord::{CoordError, GeoBounds};

/// Extent of the San Francisco catalog.
pub const SF_BOUNDS: GeoBounds = GeoBounds {
    north: 37.84,
    south: 37.70,
    east: -122.35,
    west: -122.52,
};

/// Attribution required by OpenStreetMap tiles.
pub const MAP_ATTRIBUTION: &str = "© OpenStreetMap contributors";

/// Errors loading a catalog file.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Failed to read catalog: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse catalog: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Area '{id}' has invalid bounds: {source}")]
    InvalidArea {
        id: String,
        #[source]
        source: CoordError,
    },

    #[error("Duplicate area id '{0}'")]
    DuplicateId(String),
}

/// A downloadable map area.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapArea {
    pub id: String,
    pub name: String,
    pub bounds: GeoBounds,
    pub description: String,
    pub price: f64,
    pub landmarks: Vec<String>,
}

impl MapArea {
    /// Closed outline polygon, NW → NE → SE → SW → NW.
    pub fn boundary_geojson(&self) -> Value {
        let b = &self.bounds;
        json!({
            "type": "Feature",
            "properties": { "id": self.id, "name": self.name },
            "geometry": {
                "type": "Polygon",
                "coordinates": [[
                    [b.west, b.north],
                    [b.east, b.north],
                    [b.east, b.south],
                    [b.west, b.south],
                    [b.west, b.north]
                ]]
            }
        })
    }

    /// Marker position `(lon, lat)` of landmark `index`.
    ///
    /// Landmarks have no surveyed coordinates; they are spread along the
    /// area's diagonal from the south-west corner.
    pub fn landmark_position(&self, index: usize) -> (f64, f64) {
        let steps = (self.landmarks.len() + 1) as f64;
        let t = (index + 1) as f64 / steps;
        (
            self.bounds.west + self.bounds.lon_span() * t,
            self.bounds.south + self.bounds.lat_span() * t,
        )
    }

    /// Landmark markers as a FeatureCollection of points.
    pub fn landmarks_geojson(&self) -> Value {
        let features: Vec<Value> = self
            .landmarks
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let (lon, lat) = self.landmark_position(i);
                json!({
                    "type": "Feature",
                    "properties": { "name": name },
                    "geometry": { "type": "Point", "coordinates": [lon, lat] }
                })
            })
            .collect();

        json!({ "type": "FeatureCollection", "features": features })
    }
}

/// Ordered set of map areas.
#[derive(Debug, Clone, PartialEq)]
pub struct Catalog {
    areas: Vec<MapArea>,
}

impl Catalog {
    /// Builds a catalog, rejecting invalid bounds and duplicate ids.
    pub fn new(areas: Vec<MapArea>) -> Result<Self, CatalogError> {
        for (i, area) in areas.iter().enumerate() {
            area.bounds
                .validate()
                .map_err(|source| CatalogError::InvalidArea {
                    id: area.id.clone(),
                    source,
                })?;
            if areas[..i].iter().any(|a| a.id == area.id) {
                return Err(CatalogError::DuplicateId(area.id.clone()));
            }
        }
        Ok(Self { areas })
    }

    /// The built-in San Francisco areas.
    pub fn san_francisco() -> Self {
        fn area(
            id: &str,
            name: &str,
            (north, south, east, west): (f64, f64, f64, f64),
            description: &str,
            price: f64,
            landmarks: [&str; 3],
        ) -> MapArea {
            MapArea {
                id: id.to_string(),
                name: name.to_string(),
                bounds: GeoBounds {
                    north,
                    south,
                    east,
                    west,
                },
                description: description.to_string(),
                price,
                landmarks: landmarks.iter().map(|l| l.to_string()).collect(),
            }
        }

        Self {
            areas: vec![
                area(
                    "downtown",
                    "Downtown SF",
                    (37.79, 37.77, -122.39, -122.42),
                    "Financial District and surrounding areas",
                    4.99,
                    ["Salesforce Tower", "Ferry Building", "Union Square"],
                ),
                area(
                    "mission",
                    "Mission District",
                    (37.77, 37.75, -122.41, -122.43),
                    "Vibrant neighborhood with great food and culture",
                    3.99,
                    ["Mission Dolores", "Dolores Park", "Mission Street"],
                ),
                area(
                    "golden-gate",
                    "Golden Gate Area",
                    (37.81, 37.79, -122.47, -122.49),
                    "Including the famous bridge and surrounding parks",
                    5.99,
                    ["Golden Gate Bridge", "Presidio", "Palace of Fine Arts"],
                ),
                area(
                    "sunset",
                    "Sunset District",
                    (37.76, 37.74, -122.46, -122.51),
                    "Peaceful residential area near Ocean Beach",
                    4.99,
                    ["Ocean Beach", "Golden Gate Park", "Sunset Boulevard"],
                ),
            ],
        }
    }

    /// Loads a catalog from a JSON array of areas.
    pub fn from_json_file(path: &Path) -> Result<Self, CatalogError> {
        let content = fs::read_to_string(path)?;
        let areas: Vec<MapArea> = serde_json::from_str(&content)?;
        Self::new(areas)
    }

    pub fn areas(&self) -> &[MapArea] {
        &self.areas
    }

    pub fn find(&self, id: &str) -> Option<&MapArea> {
        self.areas.iter().find(|a| a.id == id)
    }

    pub fn len(&self) -> usize {
        self.areas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.areas.is_empty()
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::san_francisco()
    }
}
