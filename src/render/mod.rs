//! Map products coloured by maximum water elevation.
//!
//! Submodules:
//! - `color`: the elevation colour ramp.
//! - `kml`: KML placemark writer.
//! - `geojson`: GeoJSON FeatureCollection writer.

pub mod color;
pub mod geojson;
pub mod kml;

use crate::analysis::{join, NodePool};
use crate::geometry::Point;
use crate::model::{is_measured, Region, Result, SurgeError, Triangle};

pub use color::Rgb;

/// Alpha used for every filled triangle (160 of 255).
pub const FILL_ALPHA: u8 = 0xa0;

/// One filled polygon handed to a sink.
#[derive(Debug, Clone, PartialEq)]
pub struct ColoredPolygon {
    pub ring: Vec<Point>,
    pub color: Rgb,
    pub alpha: u8,
}

/// Destination for coloured polygons (a KML or GeoJSON document).
pub trait PolygonSink {
    fn add_polygon(&mut self, polygon: &ColoredPolygon) -> Result<()>;

    /// Writes whatever closes the document. Call once, after the last polygon.
    fn finish(&mut self) -> Result<()>;
}

/// Sends every mesh triangle with a vertex inside `outline` to `sink`.
///
/// A triangle takes the colour of its highest vertex; triangles whose three
/// vertices are all dry are left out. Returns the number of polygons sent.
pub fn render_triangles(
    pool: &NodePool,
    triangles: &[Triangle],
    outline: &Region,
    sink: &mut dyn PolygonSink,
) -> Result<usize> {
    let positions: Vec<Point> = pool.nodes().iter().map(|n| n.position).collect();
    let touched = join::triangles_touching(outline, triangles, &positions);

    let mut sent = 0;
    for t in touched {
        let mut ring = Vec::with_capacity(3);
        let mut peak: Option<f64> = None;
        for &n in &triangles[t].0 {
            let node = pool.get(n).ok_or_else(|| {
                SurgeError::Inconsistent(format!("triangle {} refers to missing node {}", t + 1, n))
            })?;
            ring.push(node.position);
            if is_measured(node.elevation) {
                peak = Some(peak.map_or(node.elevation, |p| p.max(node.elevation)));
            }
        }
        let Some(color) = peak.and_then(color::ramp) else {
            continue;
        };
        sink.add_polygon(&ColoredPolygon {
            ring,
            color,
            alpha: FILL_ALPHA,
        })?;
        sent += 1;
    }
    sink.finish()?;
    Ok(sent)
}
