/// Administrative boundary reader
///
/// Reads GADM-style boundaries exported to GeoJSON (for example with
/// `ogr2ogr -f GeoJSON`). Each feature carries its hierarchy in the
/// `NAME_1` (province), `NAME_2` (town) and `NAME_3` (barangay) properties.
///
/// Polygon and MultiPolygon rings are all flattened into the region's ring
/// list. Interior rings become independent shapes, matching how shapefile
/// parts are treated everywhere else in the pipeline.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::geometry::{Point, Ring};
use crate::ingest::PolygonSource;
use crate::model::{AdminLevel, Region, Result, SurgeError};

// ============================================================================
// GeoJSON structures
// ============================================================================

#[derive(Debug, Deserialize)]
struct FeatureCollection {
    features: Vec<Feature>,
}

#[derive(Debug, Deserialize)]
struct Feature {
    #[serde(default)]
    properties: Option<Map<String, Value>>,
    geometry: Option<Geometry>,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    coordinates: Value,
}

/// Positions may carry a third (height) value, so they stay as `Vec<f64>`.
type PolygonCoords = Vec<Vec<Vec<f64>>>;

// ============================================================================
// Parsing
// ============================================================================

/// Parses a FeatureCollection into regions at `level`, in feature order.
///
/// Features without a polygonal geometry are skipped. Features missing one
/// of the hierarchy names the level needs are an error.
pub fn parse_boundaries(text: &str, level: AdminLevel, origin: &str) -> Result<Vec<Region>> {
    let collection: FeatureCollection = serde_json::from_str(text)
        .map_err(|e| SurgeError::malformed(origin, e.line(), e.to_string()))?;

    let mut regions = Vec::with_capacity(collection.features.len());
    for (i, feature) in collection.features.into_iter().enumerate() {
        let polygons: Vec<PolygonCoords> = match feature.geometry {
            Some(g) if g.kind == "Polygon" => vec![coordinates(g.coordinates, origin, i)?],
            Some(g) if g.kind == "MultiPolygon" => coordinates(g.coordinates, origin, i)?,
            _ => continue,
        };
        let rings = rings_of(polygons, origin, i)?;
        let properties = feature.properties.unwrap_or_default();
        let path = hierarchy_path(&properties, level)
            .map_err(|field| SurgeError::malformed(origin, 0, format!("feature {} has no {}", i, field)))?;
        regions.push(Region::new(path, level, rings));
    }
    Ok(regions)
}

fn hierarchy_path(
    properties: &Map<String, Value>,
    level: AdminLevel,
) -> std::result::Result<Vec<String>, &'static str> {
    [AdminLevel::Province, AdminLevel::Town, AdminLevel::Barangay]
        .into_iter()
        .take(level.depth())
        .map(|l| {
            let field = l.name_field();
            properties
                .get(field)
                .and_then(Value::as_str)
                .map(|s| s.trim().to_string())
                .ok_or(field)
        })
        .collect()
}

fn coordinates<T: serde::de::DeserializeOwned>(value: Value, origin: &str, feature: usize) -> Result<T> {
    serde_json::from_value(value)
        .map_err(|e| SurgeError::malformed(origin, 0, format!("feature {}: {}", feature, e)))
}

fn rings_of(polygons: Vec<PolygonCoords>, origin: &str, feature: usize) -> Result<Vec<Ring>> {
    let mut rings = Vec::new();
    for polygon in polygons {
        for ring in polygon {
            let mut points = Vec::with_capacity(ring.len());
            for position in ring {
                match position.as_slice() {
                    [lon, lat, ..] => points.push(Point::new(*lon, *lat)),
                    _ => {
                        return Err(SurgeError::malformed(
                            origin,
                            0,
                            format!("feature {} has a position with fewer than 2 values", feature),
                        ));
                    }
                }
            }
            rings.push(points);
        }
    }
    Ok(rings)
}

/// Keeps the regions of one province, in record order.
pub fn in_province(regions: Vec<Region>, province: &str) -> Vec<Region> {
    regions
        .into_iter()
        .filter(|r| r.province() == Some(province))
        .collect()
}

// ============================================================================
// File source
// ============================================================================

/// A GeoJSON boundary file on disk.
pub struct GeoJsonBoundaries {
    pub path: PathBuf,
}

impl GeoJsonBoundaries {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl PolygonSource for GeoJsonBoundaries {
    fn load_regions(&mut self, level: AdminLevel) -> Result<Vec<Region>> {
        let text = fs::read_to_string(&self.path).map_err(|e| SurgeError::io(&self.path, e))?;
        parse_boundaries(&text, level, &display(&self.path))
    }
}

fn display(path: &Path) -> String {
    path.display().to_string()
}

// ============================================================================
// Tests
// ============================================================================
