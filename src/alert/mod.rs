//! Warning and notification generation.
//!
//! Submodules:
//! - `warnings`: per-region evaluation against the node pool (run context).
//! - `neighbors`: shared-vertex adjacency, its cache file, and propagation.
//! - `onset`: earliest time each warned region crosses the onset threshold.
//! - `thresholds`: the onset threshold itself.
//! - `report`: text renderings of warnings, notifications and onsets.

pub mod neighbors;
pub mod onset;
pub mod report;
pub mod thresholds;
pub mod warnings;

pub use neighbors::NeighborGraph;
pub use warnings::{RegionOutcome, RunContext};
