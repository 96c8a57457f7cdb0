//! Input Verification Module
//!
//! Checks the configured model run and boundary files before a warning run:
//! mesh integrity, region geometry and neighbor-graph symmetry. The report is
//! serializable so it can be archived next to the products it vouches for.
//!
//! Use this when switching to a new grid, boundary set or province.

use std::fs;
use std::io::ErrorKind;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::alert::neighbors::{self, NeighborGraph};
use crate::config::SurgeConfig;
use crate::ingest::adcirc::{Fort14File, Maxele63File};
use crate::ingest::boundaries::{self, GeoJsonBoundaries};
use crate::ingest::{ElevationSource, MeshSource, PolygonSource};
use crate::model::{is_measured, AdminLevel, Mesh, Region, Result, SurgeError};

// ============================================================================
// Verification Results
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationReport {
    pub timestamp: String,
    pub scope: String,
    pub mesh: MeshVerification,
    pub regions: Vec<RegionVerification>,
    pub neighbors: NeighborVerification,
    pub summary: VerificationSummary,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationSummary {
    pub regions_total: usize,
    pub regions_ok: usize,
    pub regions_failed: usize,
    pub overall: VerificationStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeshVerification {
    pub title: String,
    pub status: VerificationStatus,
    pub node_count: usize,
    pub triangle_count: usize,
    pub elevation_count: usize,
    pub dry_nodes: usize,
    /// 1-based element numbers of triangles pointing at missing nodes.
    pub dangling_triangles: Vec<usize>,
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegionVerification {
    pub name: String,
    pub parent: Option<String>,
    pub status: VerificationStatus,
    pub ring_count: usize,
    pub vertex_count: usize,
    /// Rings with fewer than three vertices.
    pub degenerate_rings: usize,
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NeighborVerification {
    pub status: VerificationStatus,
    /// Whether the graph came from an existing cache file.
    pub cached: bool,
    pub entries: usize,
    pub asymmetric_pairs: Vec<(String, String)>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub enum VerificationStatus {
    Success,
    PartialSuccess,
    Failed,
}

// ============================================================================
// Mesh Verification
// ============================================================================

pub fn verify_mesh(mesh: &Mesh, elevations: &[f64]) -> MeshVerification {
    let node_count = mesh.nodes.len();
    let mut result = MeshVerification {
        title: mesh.title.clone(),
        status: VerificationStatus::Failed,
        node_count,
        triangle_count: mesh.triangles.len(),
        elevation_count: elevations.len(),
        dry_nodes: elevations.iter().filter(|&&v| !is_measured(v)).count(),
        dangling_triangles: Vec::new(),
        error_message: None,
    };

    for (i, t) in mesh.triangles.iter().enumerate() {
        if t.0.iter().any(|&n| n == 0 || n > node_count) {
            result.dangling_triangles.push(i + 1);
        }
    }

    if elevations.len() != node_count {
        result.error_message = Some(format!(
            "{} elevation values for {} nodes",
            elevations.len(),
            node_count
        ));
    } else if !result.dangling_triangles.is_empty() {
        result.error_message = Some(format!(
            "{} triangles refer to missing nodes",
            result.dangling_triangles.len()
        ));
    } else if node_count > 0 && result.dry_nodes == node_count {
        result.status = VerificationStatus::PartialSuccess;
        result.error_message = Some("every node is dry".to_string());
    } else {
        result.status = VerificationStatus::Success;
    }

    result
}

// ============================================================================
// Region Verification
// ============================================================================

pub fn verify_region(region: &Region) -> RegionVerification {
    let degenerate_rings = region.rings.iter().filter(|r| r.len() < 3).count();
    let vertex_count = region.vertex_count();

    let (status, error_message) = if vertex_count == 0 {
        (VerificationStatus::Failed, Some("no ring vertices".to_string()))
    } else if degenerate_rings > 0 {
        (
            VerificationStatus::PartialSuccess,
            Some(format!("{} rings with fewer than 3 vertices", degenerate_rings)),
        )
    } else {
        (VerificationStatus::Success, None)
    };

    RegionVerification {
        name: region.name().to_string(),
        parent: region.parent().map(String::from),
        status,
        ring_count: region.rings.len(),
        vertex_count,
        degenerate_rings,
        error_message,
    }
}

// ============================================================================
// Neighbor Graph Verification
// ============================================================================

pub fn verify_neighbors(graph: &NeighborGraph, cached: bool) -> NeighborVerification {
    let asymmetric_pairs = graph.asymmetric_pairs();
    NeighborVerification {
        status: if asymmetric_pairs.is_empty() {
            VerificationStatus::Success
        } else {
            VerificationStatus::Failed
        },
        cached,
        entries: graph.len(),
        asymmetric_pairs,
    }
}

// ============================================================================
// Full Verification Runner
// ============================================================================

/// Assembles a report from already-loaded inputs.
pub fn build_report(
    scope: &str,
    mesh: &Mesh,
    elevations: &[f64],
    regions: &[Region],
    graph: &NeighborGraph,
    graph_cached: bool,
) -> VerificationReport {
    let mesh = verify_mesh(mesh, elevations);
    let regions: Vec<RegionVerification> = regions.iter().map(verify_region).collect();
    let neighbors = verify_neighbors(graph, graph_cached);

    let regions_failed = regions
        .iter()
        .filter(|r| r.status == VerificationStatus::Failed)
        .count();
    let regions_ok = regions.len() - regions_failed;

    let statuses = regions
        .iter()
        .map(|r| r.status)
        .chain([mesh.status, neighbors.status]);
    let overall = statuses.fold(VerificationStatus::Success, |acc, s| match (acc, s) {
        (VerificationStatus::Failed, _) | (_, VerificationStatus::Failed) => VerificationStatus::Failed,
        (VerificationStatus::PartialSuccess, _) | (_, VerificationStatus::PartialSuccess) => {
            VerificationStatus::PartialSuccess
        }
        _ => VerificationStatus::Success,
    });

    VerificationReport {
        timestamp: Utc::now().to_rfc3339(),
        scope: scope.to_string(),
        summary: VerificationSummary {
            regions_total: regions.len(),
            regions_ok,
            regions_failed,
            overall,
        },
        mesh,
        regions,
        neighbors,
    }
}

/// Loads the configured inputs and verifies them. The neighbor cache is read
/// if present but never written.
pub fn run_verification(config: &SurgeConfig) -> Result<VerificationReport> {
    let scope = config.scope.province.as_str();

    println!("Verifying mesh {} ...", config.inputs.mesh.display());
    let mesh = Fort14File::new(&config.inputs.mesh).load_mesh()?;
    let elevations = Maxele63File::new(&config.inputs.max_elevation).load_max_elevations()?;

    println!("Verifying town boundaries for {} ...", scope);
    let towns = GeoJsonBoundaries::new(&config.inputs.towns).load_regions(AdminLevel::Town)?;
    let towns = boundaries::in_province(towns, scope);

    let cache = neighbors::cache_path(&config.output.neighbor_cache_dir, scope);
    let (graph, cached) = match fs::read_to_string(&cache) {
        Ok(text) => (NeighborGraph::parse(&text), true),
        Err(e) if e.kind() == ErrorKind::NotFound => (NeighborGraph::build(&towns), false),
        Err(e) => return Err(SurgeError::io(&cache, e)),
    };

    Ok(build_report(scope, &mesh, &elevations, &towns, &graph, cached))
}

pub fn print_summary(report: &VerificationReport) {
    println!("\n===========================================================");
    println!("VERIFICATION SUMMARY ({})", report.scope);
    println!("===========================================================");
    println!();
    println!(
        "Mesh:       {:?} ({} nodes, {} triangles, {} dry)",
        report.mesh.status, report.mesh.node_count, report.mesh.triangle_count, report.mesh.dry_nodes
    );
    if let Some(msg) = &report.mesh.error_message {
        println!("            {}", msg);
    }
    println!(
        "Regions:    {}/{} usable  ({} failed)",
        report.summary.regions_ok, report.summary.regions_total, report.summary.regions_failed
    );
    for r in report.regions.iter().filter(|r| r.status != VerificationStatus::Success) {
        println!("   {} {:?}: {}", r.name, r.status, r.error_message.as_deref().unwrap_or("Unknown"));
    }
    println!(
        "Neighbors:  {:?} ({} entries, {}, {} asymmetric pairs)",
        report.neighbors.status,
        report.neighbors.entries,
        if report.neighbors.cached { "cached" } else { "rebuilt" },
        report.neighbors.asymmetric_pairs.len()
    );
    println!();
    println!("Overall: {:?}", report.summary.overall);
    println!("===========================================================");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;
    use crate::model::{MeshNode, Triangle, ELEVATION_SENTINEL};

    fn mesh() -> Mesh {
        Mesh {
            title: "test grid".into(),
            nodes: (0..4)
                .map(|i| MeshNode {
                    position: Point::new(i as f64, 0.0),
                    depth: 1.0,
                })
                .collect(),
            triangles: vec![Triangle([1, 2, 3]), Triangle([2, 3, 9])],
        }
    }

    fn town(name: &str, rings: Vec<Vec<Point>>) -> Region {
        Region::new(vec!["Leyte".into(), name.into()], AdminLevel::Town, rings)
    }

    #[test]
    fn test_mesh_dangling_triangles_fail() {
        let result = verify_mesh(&mesh(), &[1.0, 2.0, ELEVATION_SENTINEL, 0.5]);
        assert_eq!(result.status, VerificationStatus::Failed);
        assert_eq!(result.dangling_triangles, vec![2]);
        assert_eq!(result.dry_nodes, 1);
    }

    #[test]
    fn test_mesh_elevation_count_mismatch_fails() {
        let mut m = mesh();
        m.triangles.pop();
        let result = verify_mesh(&m, &[1.0]);
        assert_eq!(result.status, VerificationStatus::Failed);
        assert!(result.error_message.unwrap().contains("1 elevation values for 4 nodes"));
    }

    #[test]
    fn test_all_dry_mesh_is_partial() {
        let mut m = mesh();
        m.triangles.pop();
        let result = verify_mesh(&m, &[ELEVATION_SENTINEL; 4]);
        assert_eq!(result.status, VerificationStatus::PartialSuccess);
    }

    #[test]
    fn test_region_checks() {
        let square = vec![
            Point::new(0.0, 0.0),
            Point::new(1.0, 0.0),
            Point::new(1.0, 1.0),
        ];
        assert_eq!(verify_region(&town("Palo", vec![square.clone()])).status, VerificationStatus::Success);
        assert_eq!(
            verify_region(&town("Palo", vec![square, vec![Point::new(3.0, 3.0)]])).status,
            VerificationStatus::PartialSuccess
        );
        assert_eq!(verify_region(&town("Void", vec![])).status, VerificationStatus::Failed);
    }

    #[test]
    fn test_report_overall_status_and_serialization() {
        let mut m = mesh();
        m.triangles.pop();
        let towns = vec![
            town("Palo", vec![vec![Point::new(0.0, 0.0), Point::new(1.0, 0.0), Point::new(1.0, 1.0)]]),
            town("Void", vec![]),
        ];
        let graph = NeighborGraph::build(&towns);

        let report = build_report("Leyte", &m, &[1.0; 4], &towns, &graph, false);

        assert_eq!(report.summary.regions_total, 2);
        assert_eq!(report.summary.regions_failed, 1);
        assert_eq!(report.summary.overall, VerificationStatus::Failed);
        assert_eq!(report.neighbors.status, VerificationStatus::Success);

        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("\"scope\":\"Leyte\""));
    }

    #[test]
    fn test_asymmetric_cache_fails_neighbors() {
        let graph = NeighborGraph::parse("Palo,Tanauan\nTanauan\n");
        let result = verify_neighbors(&graph, true);
        assert_eq!(result.status, VerificationStatus::Failed);
        assert_eq!(result.asymmetric_pairs.len(), 1);
    }
}
