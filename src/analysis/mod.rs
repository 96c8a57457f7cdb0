/// Spatial analysis over the mesh node set.
///
/// This module owns the node arena and the two-phase spatial filter that
/// associates nodes with administrative polygons: a coarse geodesic radius
/// prune followed by exact ring containment.
///
/// Submodules:
/// - `pool`: the node arena with its liveness bitmap.
/// - `candidates`: radius-based coarse filter around a region centroid.
/// - `join`: exact point-in-polygon membership over a point set.

pub mod candidates;
pub mod join;
pub mod pool;

pub use candidates::{CandidateSet, SearchArea};
pub use pool::NodePool;
