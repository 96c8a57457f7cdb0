//! Inundation GeoJSON writer.
//!
//! Features are buffered and the whole FeatureCollection is serialized on
//! `finish`. Styling follows the simplestyle properties (`fill`,
//! `fill-opacity`, `stroke-opacity`) that web map viewers understand.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{json, Value};

use crate::model::{Result, SurgeError};
use crate::render::{ColoredPolygon, PolygonSink};

/// `inundation_<typhoon>_<province>.geojson`, dropping the typhoon part when
/// it is unknown.
pub fn file_name(typhoon: &str, province: &str) -> String {
    if typhoon.is_empty() {
        format!("inundation_{}.geojson", province)
    } else {
        format!("inundation_{}_{}.geojson", typhoon, province)
    }
}

/// Builds a FeatureCollection in memory and writes it to `path` on finish.
pub struct GeoJsonWriter {
    path: PathBuf,
    features: Vec<Value>,
}

impl GeoJsonWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            features: Vec::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn collection(&self) -> Value {
        json!({
            "type": "FeatureCollection",
            "features": self.features,
        })
    }
}

impl PolygonSink for GeoJsonWriter {
    fn add_polygon(&mut self, polygon: &ColoredPolygon) -> Result<()> {
        let mut ring: Vec<[f64; 2]> = polygon.ring.iter().map(|p| [p.lon, p.lat]).collect();
        // GeoJSON rings are explicitly closed.
        if let (Some(&first), Some(&last)) = (ring.first(), ring.last()) {
            if first != last {
                ring.push(first);
            }
        }
        self.features.push(json!({
            "id": self.features.len(),
            "type": "Feature",
            "geometry": { "type": "Polygon", "coordinates": [ring] },
            "properties": {
                "fill": polygon.color.hex(),
                "fill-opacity": f64::from(polygon.alpha) / 255.0,
                "stroke-opacity": 0,
            },
        }));
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        let text = serde_json::to_string_pretty(&self.collection())
            .map_err(|e| SurgeError::Inconsistent(format!("cannot serialize GeoJSON: {}", e)))?;
        fs::write(&self.path, text).map_err(|e| SurgeError::io(&self.path, e))
    }
}
