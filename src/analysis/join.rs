//! Exact point-in-polygon membership.
//!
//! A node belongs to a region when any one of the region's rings contains
//! it. The per-ring vectors are kept because callers sometimes need to know
//! which island a point fell in.

use crate::geometry::{self, Point};
use crate::model::{Region, Triangle};

/// One membership vector per ring, each parallel to `points`.
pub fn ring_membership(region: &Region, points: &[Point]) -> Vec<Vec<bool>> {
    region
        .rings
        .iter()
        .map(|ring| points.iter().map(|p| geometry::point_in_ring(*p, ring)).collect())
        .collect()
}

/// Collapses per-ring vectors into "inside any ring".
pub fn any_ring(membership: &[Vec<bool>], point_count: usize) -> Vec<bool> {
    let mut inside = vec![false; point_count];
    for ring in membership {
        for (slot, &hit) in inside.iter_mut().zip(ring) {
            *slot |= hit;
        }
    }
    inside
}

/// Membership of each point in the region as a whole.
pub fn region_membership(region: &Region, points: &[Point]) -> Vec<bool> {
    any_ring(&ring_membership(region, points), points.len())
}

pub fn region_contains(region: &Region, point: Point) -> bool {
    geometry::point_in_rings(point, &region.rings)
}

/// First region below `parent` (by hierarchy path) whose rings contain
/// `point`, in record order.
pub fn locate_sub_region<'a>(
    sub_regions: &'a [Region],
    parent: &Region,
    point: Point,
) -> Option<&'a Region> {
    sub_regions
        .iter()
        .filter(|sub| sub.is_within(parent))
        .find(|sub| region_contains(sub, point))
}

/// Indices (0-based, into `triangles`) of the elements with at least one
/// vertex inside the region.
///
/// `positions` is indexed by node number minus one. Triangles that refer to
/// nodes outside `positions` are skipped.
pub fn triangles_touching(
    region: &Region,
    triangles: &[Triangle],
    positions: &[Point],
) -> Vec<usize> {
    let inside = region_membership(region, positions);
    let hit = |node: usize| {
        node.checked_sub(1)
            .and_then(|i| inside.get(i).copied())
            .unwrap_or(false)
    };
    triangles
        .iter()
        .enumerate()
        .filter(|(_, t)| t.0.iter().any(|&n| hit(n)))
        .map(|(i, _)| i)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::AdminLevel;

    fn square(x0: f64, y0: f64, size: f64) -> Vec<Point> {
        vec![
            Point::new(x0, y0),
            Point::new(x0 + size, y0),
            Point::new(x0 + size, y0 + size),
            Point::new(x0, y0 + size),
        ]
    }

    fn two_islands() -> Region {
        Region::new(
            vec!["P".into(), "Islands".into()],
            AdminLevel::Town,
            vec![square(0.0, 0.0, 1.0), square(10.0, 10.0, 1.0)],
        )
    }

    #[test]
    fn test_membership_has_one_vector_per_ring() {
        let points = [Point::new(0.5, 0.5), Point::new(10.5, 10.5), Point::new(5.0, 5.0)];
        let m = ring_membership(&two_islands(), &points);
        assert_eq!(m, vec![vec![true, false, false], vec![false, true, false]]);
        assert_eq!(any_ring(&m, points.len()), vec![true, true, false]);
    }

    #[test]
    fn test_point_in_second_ring_is_in_region() {
        assert!(region_contains(&two_islands(), Point::new(10.2, 10.7)));
    }

    #[test]
    fn test_locate_sub_region_respects_hierarchy() {
        let town = Region::new(vec!["P".into(), "T".into()], AdminLevel::Town, vec![square(0.0, 0.0, 2.0)]);
        let subs = vec![
            // Same shape but under another town: must be ignored.
            Region::new(
                vec!["P".into(), "Other".into(), "Decoy".into()],
                AdminLevel::Barangay,
                vec![square(0.0, 0.0, 2.0)],
            ),
            Region::new(
                vec!["P".into(), "T".into(), "West".into()],
                AdminLevel::Barangay,
                vec![square(0.0, 0.0, 1.0)],
            ),
            Region::new(
                vec!["P".into(), "T".into(), "East".into()],
                AdminLevel::Barangay,
                vec![square(1.0, 0.0, 1.0)],
            ),
        ];
        let found = locate_sub_region(&subs, &town, Point::new(1.5, 0.5));
        assert_eq!(found.map(Region::name), Some("East"));
        assert!(locate_sub_region(&subs, &town, Point::new(5.0, 5.0)).is_none());
    }

    #[test]
    fn test_triangle_with_one_vertex_inside_is_touching() {
        let region = Region::new(vec!["P".into()], AdminLevel::Province, vec![square(0.0, 0.0, 1.0)]);
        let positions = vec![
            Point::new(0.5, 0.5),
            Point::new(3.0, 3.0),
            Point::new(4.0, 3.0),
            Point::new(4.0, 4.0),
        ];
        let triangles = vec![Triangle([1, 2, 3]), Triangle([2, 3, 4]), Triangle([4, 9, 1])];
        assert_eq!(triangles_touching(&region, &triangles, &positions), vec![0, 2]);
    }
}
