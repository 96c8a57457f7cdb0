//! Geometry primitives on (longitude, latitude) coordinates.
//!
//! Distances are ellipsoidal (WGS84 geodesics via `geo`); containment is a
//! planar crossing-number test in degree space, which is what the boundary
//! data was digitised in.

use geo::GeodesicDistance;

use crate::model::{Direction, Result, SurgeError};

/// A position in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub lon: f64,
    pub lat: f64,
}

impl Point {
    pub const fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }
}

impl From<Point> for geo::Point<f64> {
    fn from(p: Point) -> Self {
        geo::Point::new(p.lon, p.lat)
    }
}

/// An ordered vertex list, implicitly closed.
pub type Ring = Vec<Point>;

// ---------------------------------------------------------------------------
// Distances
// ---------------------------------------------------------------------------

/// Geodesic distance in meters on the WGS84 ellipsoid.
pub fn geodesic_distance(a: Point, b: Point) -> f64 {
    geo::Point::from(a).geodesic_distance(&geo::Point::from(b))
}

/// Arithmetic mean of the given vertices (not area weighted).
///
/// `label` names the geometry in the error returned for an empty input.
pub fn centroid<'a, I>(points: I, label: &str) -> Result<Point>
where
    I: IntoIterator<Item = &'a Point>,
{
    let mut count = 0usize;
    let (mut sum_lon, mut sum_lat) = (0.0, 0.0);
    for p in points {
        sum_lon += p.lon;
        sum_lat += p.lat;
        count += 1;
    }
    if count == 0 {
        return Err(SurgeError::EmptyGeometry(label.to_string()));
    }
    Ok(Point::new(sum_lon / count as f64, sum_lat / count as f64))
}

/// Largest geodesic distance from `center` to any of `points`.
pub fn max_distance<'a, I>(center: Point, points: I, label: &str) -> Result<f64>
where
    I: IntoIterator<Item = &'a Point>,
{
    points
        .into_iter()
        .map(|p| geodesic_distance(center, *p))
        .fold(None, |acc: Option<f64>, d| Some(acc.map_or(d, |m| m.max(d))))
        .ok_or_else(|| SurgeError::EmptyGeometry(label.to_string()))
}

// ---------------------------------------------------------------------------
// Containment
// ---------------------------------------------------------------------------

/// Crossing-number test of one point against one ring.
///
/// Points on an edge or vertex count as inside. Rings with fewer than three
/// vertices contain nothing but their own edges.
pub fn point_in_ring(point: Point, ring: &[Point]) -> bool {
    let n = ring.len();
    if n == 0 {
        return false;
    }

    let (x, y) = (point.lon, point.lat);
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let (a, b) = (ring[i], ring[j]);
        if on_segment(point, a, b) {
            return true;
        }
        if (a.lat > y) != (b.lat > y) {
            let x_cross = (b.lon - a.lon) * (y - a.lat) / (b.lat - a.lat) + a.lon;
            if x < x_cross {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// `true` if any ring contains the point. Rings are independent shapes.
pub fn point_in_rings(point: Point, rings: &[Ring]) -> bool {
    rings.iter().any(|ring| point_in_ring(point, ring))
}

fn on_segment(p: Point, a: Point, b: Point) -> bool {
    let cross = (b.lon - a.lon) * (p.lat - a.lat) - (b.lat - a.lat) * (p.lon - a.lon);
    if cross != 0.0 {
        return false;
    }
    p.lon >= a.lon.min(b.lon)
        && p.lon <= a.lon.max(b.lon)
        && p.lat >= a.lat.min(b.lat)
        && p.lat <= a.lat.max(b.lat)
}

// ---------------------------------------------------------------------------
// Direction
// ---------------------------------------------------------------------------

/// Octant of `to` as seen from `from`, by the signs of Δlon and Δlat.
///
/// A zero delta on one axis gives the cardinal direction of the other axis.
/// Identical points report `S`.
pub fn direction(from: Point, to: Point) -> Direction {
    let d_lon = to.lon - from.lon;
    let d_lat = to.lat - from.lat;

    if d_lon > 0.0 {
        if d_lat == 0.0 {
            Direction::E
        } else if d_lat > 0.0 {
            Direction::NE
        } else {
            Direction::SE
        }
    } else if d_lon < 0.0 {
        if d_lat == 0.0 {
            Direction::W
        } else if d_lat > 0.0 {
            Direction::NW
        } else {
            Direction::SW
        }
    } else if d_lat > 0.0 {
        Direction::N
    } else {
        Direction::S
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(x0: f64, y0: f64, size: f64) -> Ring {
        vec![
            Point::new(x0, y0),
            Point::new(x0 + size, y0),
            Point::new(x0 + size, y0 + size),
            Point::new(x0, y0 + size),
        ]
    }

    // --- Direction ----------------------------------------------------------

    #[test]
    fn test_direction_ties_resolve_to_cardinal() {
        let o = Point::new(0.0, 0.0);
        assert_eq!(direction(o, Point::new(1.0, 0.0)), Direction::E);
        assert_eq!(direction(o, Point::new(0.0, 1.0)), Direction::N);
        assert_eq!(direction(o, Point::new(-1.0, 0.0)), Direction::W);
        assert_eq!(direction(o, Point::new(0.0, -1.0)), Direction::S);
    }

    #[test]
    fn test_direction_diagonals() {
        let o = Point::new(0.0, 0.0);
        assert_eq!(direction(o, Point::new(1.0, 1.0)), Direction::NE);
        assert_eq!(direction(o, Point::new(1.0, -1.0)), Direction::SE);
        assert_eq!(direction(o, Point::new(-1.0, 1.0)), Direction::NW);
        assert_eq!(direction(o, Point::new(-1.0, -1.0)), Direction::SW);
    }

    // --- Centroid / distance ------------------------------------------------

    #[test]
    fn test_centroid_is_vertex_mean() {
        let c = centroid(&square(0.0, 0.0, 2.0), "sq").expect("non-empty");
        assert_eq!(c, Point::new(1.0, 1.0));
    }

    #[test]
    fn test_centroid_counts_repeated_closing_vertex() {
        let mut ring = square(0.0, 0.0, 2.0);
        ring.push(Point::new(0.0, 0.0));
        let c = centroid(&ring, "closed").expect("non-empty");
        assert!((c.lon - 0.8).abs() < 1e-12);
        assert!((c.lat - 0.8).abs() < 1e-12);
    }

    #[test]
    fn test_centroid_of_empty_ring_is_an_error() {
        let empty: Ring = Vec::new();
        match centroid(&empty, "Nowhere") {
            Err(SurgeError::EmptyGeometry(name)) => assert_eq!(name, "Nowhere"),
            other => panic!("expected EmptyGeometry, got {:?}", other),
        }
        assert!(max_distance(Point::new(0.0, 0.0), &empty, "Nowhere").is_err());
    }

    #[test]
    fn test_geodesic_distance_one_degree_of_latitude_at_equator() {
        let d = geodesic_distance(Point::new(0.0, 0.0), Point::new(0.0, 1.0));
        // Meridian degree at the equator on WGS84 is ~110.574 km.
        assert!((d - 110_574.0).abs() < 10.0, "got {}", d);
    }

    #[test]
    fn test_geodesic_distance_is_not_degree_delta() {
        // At 60°N a degree of longitude is roughly half a degree of latitude.
        let along_lon = geodesic_distance(Point::new(0.0, 60.0), Point::new(1.0, 60.0));
        let along_lat = geodesic_distance(Point::new(0.0, 60.0), Point::new(0.0, 61.0));
        assert!(along_lon < along_lat * 0.6);
    }

    #[test]
    fn test_max_distance_picks_farthest_vertex() {
        let c = Point::new(0.0, 0.0);
        let pts = vec![Point::new(0.0, 0.1), Point::new(0.0, 0.5), Point::new(0.2, 0.0)];
        let d = max_distance(c, &pts, "pts").expect("non-empty");
        assert_eq!(d, geodesic_distance(c, Point::new(0.0, 0.5)));
    }

    // --- Containment --------------------------------------------------------

    #[test]
    fn test_point_inside_and_outside_square() {
        let ring = square(0.0, 0.0, 1.0);
        assert!(point_in_ring(Point::new(0.5, 0.5), &ring));
        assert!(!point_in_ring(Point::new(1.5, 0.5), &ring));
        assert!(!point_in_ring(Point::new(0.5, -0.1), &ring));
    }

    #[test]
    fn test_boundary_points_are_inside() {
        let ring = square(0.0, 0.0, 1.0);
        assert!(point_in_ring(Point::new(1.0, 0.0), &ring));
        assert!(point_in_ring(Point::new(0.5, 1.0), &ring));
        assert!(point_in_ring(Point::new(0.0, 0.0), &ring));
    }

    #[test]
    fn test_concave_ring() {
        // U shape opening upward.
        let ring = vec![
            Point::new(0.0, 0.0),
            Point::new(3.0, 0.0),
            Point::new(3.0, 3.0),
            Point::new(2.0, 3.0),
            Point::new(2.0, 1.0),
            Point::new(1.0, 1.0),
            Point::new(1.0, 3.0),
            Point::new(0.0, 3.0),
        ];
        assert!(point_in_ring(Point::new(0.5, 2.0), &ring));
        assert!(!point_in_ring(Point::new(1.5, 2.0), &ring));
        assert!(point_in_ring(Point::new(2.5, 2.0), &ring));
    }

    #[test]
    fn test_point_in_second_of_two_disjoint_rings() {
        let rings = vec![square(0.0, 0.0, 1.0), square(5.0, 5.0, 1.0)];
        assert!(point_in_rings(Point::new(5.5, 5.5), &rings));
        assert!(!point_in_rings(Point::new(3.0, 3.0), &rings));
    }

    #[test]
    fn test_nested_ring_is_not_a_hole() {
        // An inner ring is another shape, so its interior stays inside.
        let rings = vec![square(0.0, 0.0, 10.0), square(4.0, 4.0, 2.0)];
        assert!(point_in_rings(Point::new(5.0, 5.0), &rings));
    }
}
