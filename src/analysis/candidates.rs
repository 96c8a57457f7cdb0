/// Coarse radius filter around a region's centroid.
///
/// Every node inside a region lies no farther from the vertex mean than the
/// farthest vertex does, so the pruned set is a cheap superset of the
/// region's interior nodes. Exact containment is left to `analysis::join`.

use crate::geometry::{self, Point};
use crate::model::{Node, Region, Result};

/// Centroid and bounding radius of a region.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchArea {
    pub center: Point,
    /// Distance from `center` to the farthest ring vertex, meters.
    pub radius_m: f64,
}

impl SearchArea {
    /// Fails with `EmptyGeometry` when the region has no vertices.
    pub fn for_region(region: &Region) -> Result<Self> {
        let center = geometry::centroid(region.vertices(), region.name())?;
        let radius_m = geometry::max_distance(center, region.vertices(), region.name())?;
        Ok(Self { center, radius_m })
    }
}

/// Nodes near a region, with parallel index / coordinate / distance lists.
///
/// `indices` refers back into the global pool so that a later claim can
/// remove the nodes there rather than from this copy.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CandidateSet {
    pub indices: Vec<usize>,
    pub positions: Vec<Point>,
    pub elevations: Vec<f64>,
    pub distances_m: Vec<f64>,
}

impl CandidateSet {
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    fn push(&mut self, node: &Node, distance_m: f64) {
        self.indices.push(node.index);
        self.positions.push(node.position);
        self.elevations.push(node.elevation);
        self.distances_m.push(distance_m);
    }

    /// Keeps only the entries whose index passes `keep`.
    pub fn retain_indices(&mut self, mut keep: impl FnMut(usize) -> bool) {
        let mut out = CandidateSet::default();
        for i in 0..self.len() {
            if keep(self.indices[i]) {
                out.indices.push(self.indices[i]);
                out.positions.push(self.positions[i]);
                out.elevations.push(self.elevations[i]);
                out.distances_m.push(self.distances_m[i]);
            }
        }
        *self = out;
    }

    /// Position in this set of the entry closest to the search center.
    /// Ties go to the earlier (lower-index) node.
    pub fn nearest(&self) -> Option<usize> {
        let mut best: Option<usize> = None;
        for (i, &d) in self.distances_m.iter().enumerate() {
            match best {
                Some(b) if self.distances_m[b] <= d => {}
                _ => best = Some(i),
            }
        }
        best
    }
}

/// Selects measured nodes strictly closer than `radius + extra_m` to the
/// area's center.
///
/// Callers decide which nodes to offer: the live pool for warnings, every
/// node for onset lookups.
pub fn prune<'a, I>(nodes: I, area: &SearchArea, extra_m: f64) -> CandidateSet
where
    I: IntoIterator<Item = &'a Node>,
{
    let limit = area.radius_m + extra_m;
    let mut set = CandidateSet::default();
    for node in nodes {
        if !node.is_measured() {
            continue;
        }
        let d = geometry::geodesic_distance(area.center, node.position);
        if d < limit {
            set.push(node, d);
        }
    }
    set
}
