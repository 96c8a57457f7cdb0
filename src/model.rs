/// Core data types for the storm-surge warning service.
///
/// This module defines the shared domain model imported by all other modules:
/// mesh nodes and triangles, administrative regions, the warning and
/// notification records the pipeline produces, and the crate error type.
/// It contains no I/O.

use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::geometry::{Point, Ring};

// ---------------------------------------------------------------------------
// Elevation constants
// ---------------------------------------------------------------------------

/// ADCIRC marker for a node that never got wet (or has no valid value).
pub const ELEVATION_SENTINEL: f64 = -99999.0;

/// Returns `true` if the value is a real water-elevation measurement.
///
/// The sentinel and NaN are never measurements; they must not reach a
/// max-reduction or a candidate set.
pub fn is_measured(elevation: f64) -> bool {
    !elevation.is_nan() && elevation != ELEVATION_SENTINEL
}

// ---------------------------------------------------------------------------
// Mesh types
// ---------------------------------------------------------------------------

/// A mesh vertex joined with its maximum water elevation.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    /// 1-based mesh node number, stable for the whole run.
    pub index: usize,
    pub position: Point,
    /// Maximum elevation in meters, or `ELEVATION_SENTINEL`.
    pub elevation: f64,
}

impl Node {
    pub fn is_measured(&self) -> bool {
        is_measured(self.elevation)
    }
}

/// One mesh vertex as read from the grid file, before elevations are joined.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshNode {
    pub position: Point,
    /// Bathymetric depth (positive below datum).
    pub depth: f64,
}

/// Three 1-based node indices describing one mesh element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Triangle(pub [usize; 3]);

/// Everything the grid file provides.
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    pub title: String,
    pub nodes: Vec<MeshNode>,
    pub triangles: Vec<Triangle>,
}

// ---------------------------------------------------------------------------
// Administrative regions
// ---------------------------------------------------------------------------

/// Administrative hierarchy, coarsest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AdminLevel {
    Province,
    Town,
    Barangay,
}

impl AdminLevel {
    /// Attribute carrying this level's name in GADM-style boundary files.
    pub fn name_field(self) -> &'static str {
        match self {
            AdminLevel::Province => "NAME_1",
            AdminLevel::Town => "NAME_2",
            AdminLevel::Barangay => "NAME_3",
        }
    }

    /// Number of hierarchy names a region at this level carries.
    pub fn depth(self) -> usize {
        match self {
            AdminLevel::Province => 1,
            AdminLevel::Town => 2,
            AdminLevel::Barangay => 3,
        }
    }

    /// The next finer level, if any.
    pub fn finer(self) -> Option<AdminLevel> {
        match self {
            AdminLevel::Province => Some(AdminLevel::Town),
            AdminLevel::Town => Some(AdminLevel::Barangay),
            AdminLevel::Barangay => None,
        }
    }
}

impl fmt::Display for AdminLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AdminLevel::Province => write!(f, "province"),
            AdminLevel::Town => write!(f, "town"),
            AdminLevel::Barangay => write!(f, "barangay"),
        }
    }
}

/// A named administrative polygon.
///
/// `path` holds the names from the province down to this region, e.g.
/// `["Leyte", "Tacloban City", "Barangay 88"]`. Rings are independent
/// shapes (islands), never holes.
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    pub path: Vec<String>,
    pub level: AdminLevel,
    pub rings: Vec<Ring>,
}

impl Region {
    pub fn new(path: Vec<String>, level: AdminLevel, rings: Vec<Ring>) -> Self {
        Self { path, level, rings }
    }

    /// The region's own name (last element of its path).
    pub fn name(&self) -> &str {
        self.path.last().map(String::as_str).unwrap_or("")
    }

    /// Name of the enclosing region one level up, if any.
    pub fn parent(&self) -> Option<&str> {
        if self.path.len() < 2 {
            return None;
        }
        self.path.get(self.path.len() - 2).map(String::as_str)
    }

    /// Name of the province this region belongs to.
    pub fn province(&self) -> Option<&str> {
        self.path.first().map(String::as_str)
    }

    /// `true` if `self` lies directly or transitively inside `ancestor`,
    /// compared by name at each level.
    pub fn is_within(&self, ancestor: &Region) -> bool {
        self.path.len() > ancestor.path.len() && self.path.starts_with(&ancestor.path)
    }

    /// All ring vertices in record order.
    pub fn vertices(&self) -> impl Iterator<Item = &Point> {
        self.rings.iter().flat_map(|r| r.iter())
    }

    pub fn vertex_count(&self) -> usize {
        self.rings.iter().map(Vec::len).sum()
    }
}

// ---------------------------------------------------------------------------
// Pipeline products
// ---------------------------------------------------------------------------

/// A region with at least one measured node inside it.
#[derive(Debug, Clone, PartialEq)]
pub struct Warning {
    pub region: String,
    /// Maximum elevation among the claimed interior nodes, in meters.
    pub severity: f64,
    /// Finer-grained region holding the node with the maximum value.
    pub sub_region: Option<String>,
    /// Node indices this region consumed from the pool.
    pub claimed: Vec<usize>,
}

/// Compass octant of one point relative to another.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    N,
    NE,
    E,
    SE,
    S,
    SW,
    W,
    NW,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Direction::N => "N",
            Direction::NE => "NE",
            Direction::E => "E",
            Direction::SE => "SE",
            Direction::S => "S",
            Direction::SW => "SW",
            Direction::W => "W",
            Direction::NW => "NW",
        };
        f.write_str(s)
    }
}

/// Estimate for a region with nearby nodes but none inside it.
#[derive(Debug, Clone, PartialEq)]
pub struct NearestNotice {
    pub region: String,
    /// Elevation of the nearest candidate node.
    pub severity: f64,
    /// Geodesic distance from the region centroid to that node, meters.
    pub distance_m: f64,
    /// Where that node lies as seen from the centroid.
    pub direction: Direction,
    /// Highest candidate elevation near the region's coastline, if computed.
    pub shoreline_severity: Option<f64>,
}

/// Neighbors of a warned region that have no warning of their own.
#[derive(Debug, Clone, PartialEq)]
pub struct NeighborNotice {
    pub region: String,
    pub neighbors: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    Nearest(NearestNotice),
    Neighbors(NeighborNotice),
}

/// First time a flagged region saw water above the onset threshold.
#[derive(Debug, Clone, PartialEq)]
pub struct EarliestSurge {
    pub region: String,
    pub node: usize,
    pub location: Point,
    pub timestamp: DateTime<Utc>,
    /// Model seconds since the reference time.
    pub elapsed_seconds: f64,
    /// Model time step of the record.
    pub timestep: u64,
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can arise while loading inputs or running the pipeline.
#[derive(Debug, Error)]
pub enum SurgeError {
    /// A primary input could not be opened, read or written.
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// A primary input was readable but not in the expected format.
    #[error("Parse error in {origin} at line {line}: {message}")]
    Malformed {
        origin: String,
        line: usize,
        message: String,
    },
    /// Centroid or bounding radius requested for a region with no vertices.
    #[error("Region '{0}' has no ring vertices")]
    EmptyGeometry(String),
    /// Inputs that parse individually but do not agree with each other.
    #[error("Inconsistent inputs: {0}")]
    Inconsistent(String),
    #[error("Configuration error: {0}")]
    Config(String),
}

impl SurgeError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SurgeError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn malformed(origin: impl Into<String>, line: usize, message: impl Into<String>) -> Self {
        SurgeError::Malformed {
            origin: origin.into(),
            line,
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, SurgeError>;
