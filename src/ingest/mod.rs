//! Input sources.
//!
//! The pipeline only sees the typed records below; each on-disk format gets
//! its own implementation of the matching trait.
//!
//! Submodules:
//! - `adcirc`: fort.14 grids, maxele.63 / fort.63 elevation files, fort.15 start time.
//! - `boundaries`: administrative polygons from GeoJSON.

pub mod adcirc;
pub mod boundaries;

use std::collections::VecDeque;

use chrono::{DateTime, Utc};

use crate::model::{AdminLevel, Mesh, Region, Result};

/// Node coordinates, depths and triangle connectivity.
pub trait MeshSource {
    fn load_mesh(&mut self) -> Result<Mesh>;
}

/// Per-node maximum water elevation, node 1 first.
pub trait ElevationSource {
    fn load_max_elevations(&mut self) -> Result<Vec<f64>>;
}

/// One time step of a node-indexed elevation series.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    /// Model seconds since the reference time.
    pub elapsed_seconds: f64,
    pub timestep: u64,
    /// Elevation per node, node 1 first.
    pub values: Vec<f64>,
}

/// Sequential reader of elevation snapshots.
pub trait TimeSeriesSource {
    /// Wall-clock time corresponding to `elapsed_seconds == 0`.
    fn reference_time(&self) -> DateTime<Utc>;

    /// Returns `Ok(None)` once the series is exhausted.
    fn next_snapshot(&mut self) -> Result<Option<Snapshot>>;
}

/// Named administrative polygons at one hierarchy level.
pub trait PolygonSource {
    fn load_regions(&mut self, level: AdminLevel) -> Result<Vec<Region>>;
}

// ---------------------------------------------------------------------------
// In-memory sources
// ---------------------------------------------------------------------------

impl MeshSource for Mesh {
    fn load_mesh(&mut self) -> Result<Mesh> {
        Ok(self.clone())
    }
}

impl ElevationSource for Vec<f64> {
    fn load_max_elevations(&mut self) -> Result<Vec<f64>> {
        Ok(self.clone())
    }
}

impl PolygonSource for Vec<Region> {
    fn load_regions(&mut self, level: AdminLevel) -> Result<Vec<Region>> {
        Ok(self.iter().filter(|r| r.level == level).cloned().collect())
    }
}

/// A pre-built series, handy for replaying a few steps.
#[derive(Debug, Clone)]
pub struct MemorySeries {
    reference_time: DateTime<Utc>,
    snapshots: VecDeque<Snapshot>,
    /// How many snapshots have been handed out.
    pub consumed: usize,
}

impl MemorySeries {
    pub fn new(reference_time: DateTime<Utc>, snapshots: Vec<Snapshot>) -> Self {
        Self {
            reference_time,
            snapshots: snapshots.into(),
            consumed: 0,
        }
    }
}

impl TimeSeriesSource for MemorySeries {
    fn reference_time(&self) -> DateTime<Utc> {
        self.reference_time
    }

    fn next_snapshot(&mut self) -> Result<Option<Snapshot>> {
        let next = self.snapshots.pop_front();
        if next.is_some() {
            self.consumed += 1;
        }
        Ok(next)
    }
}
