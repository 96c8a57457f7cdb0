/// Integration tests for a full warning run on in-memory inputs
///
/// Tests verify:
/// 1. Warnings, nearest-point notices and neighbor notices for one province
/// 2. Node consumption across towns processed in record order
/// 3. The written .warnings / .notifications / .earliest files
/// 4. Neighbor cache creation and reuse
/// 5. KML and GeoJSON map output
///
/// Run with: cargo test --test pipeline_integration

use std::fs;
use std::path::Path;

use chrono::{TimeZone, Utc};

use surgemon_service::alert::RegionOutcome;
use surgemon_service::config::{EventConfig, OutputConfig, SearchSettings};
use surgemon_service::geometry::Point;
use surgemon_service::ingest::{MemorySeries, Snapshot};
use surgemon_service::model::{
    AdminLevel, Direction, Mesh, MeshNode, Notification, Region, Triangle, ELEVATION_SENTINEL,
};
use surgemon_service::pipeline::{self, RunInputs, RunOptions, RunSummary};

// ---------------------------------------------------------------------------
// Test Helpers
// ---------------------------------------------------------------------------

fn square(x0: f64, y0: f64, size: f64) -> Vec<Point> {
    vec![
        Point::new(x0, y0),
        Point::new(x0 + size, y0),
        Point::new(x0 + size, y0 + size),
        Point::new(x0, y0 + size),
    ]
}

fn region(path: &[&str], level: AdminLevel, ring: Vec<Point>) -> Region {
    Region::new(path.iter().map(|s| s.to_string()).collect(), level, vec![ring])
}

/// Five nodes: two in Palo, one in Tanauan, one just east of Dulag and a
/// dry node far to the north.
fn mesh() -> Mesh {
    let positions = [
        (0.005, 0.005),
        (0.003, 0.007),
        (0.015, 0.005),
        (0.0305, 0.005),
        (0.025, 0.5),
    ];
    Mesh {
        title: "leyte gulf test grid".into(),
        nodes: positions
            .iter()
            .map(|&(x, y)| MeshNode {
                position: Point::new(x, y),
                depth: 3.0,
            })
            .collect(),
        triangles: vec![Triangle([1, 2, 3]), Triangle([3, 4, 1])],
    }
}

fn max_elevations() -> Vec<f64> {
    vec![1.5, 0.8, 2.2, 0.6, ELEVATION_SENTINEL]
}

fn towns() -> Vec<Region> {
    vec![
        region(&["Leyte", "Palo"], AdminLevel::Town, square(0.0, 0.0, 0.01)),
        region(&["Leyte", "Tanauan"], AdminLevel::Town, square(0.01, 0.0, 0.01)),
        region(&["Leyte", "Dulag"], AdminLevel::Town, square(0.02, 0.0, 0.01)),
        region(&["Samar", "Basey"], AdminLevel::Town, square(0.0, 0.0, 0.03)),
    ]
}

fn barangays() -> Vec<Region> {
    vec![
        region(&["Leyte", "Palo", "Arado"], AdminLevel::Barangay, square(0.0, 0.0, 0.01)),
        region(&["Leyte", "Tanauan", "Bislig"], AdminLevel::Barangay, square(0.01, 0.0, 0.01)),
    ]
}

/// The outline's notch at (0.03, 0.0) is Dulag's south-east corner, so that
/// corner counts as coastline.
fn provinces() -> Vec<Region> {
    vec![region(
        &["Leyte"],
        AdminLevel::Province,
        vec![
            Point::new(-0.01, -0.01),
            Point::new(0.03, 0.0),
            Point::new(0.04, -0.01),
            Point::new(0.04, 0.02),
            Point::new(-0.01, 0.02),
        ],
    )]
}

fn series() -> MemorySeries {
    MemorySeries::new(
        Utc.with_ymd_and_hms(2013, 11, 8, 0, 0, 0).unwrap(),
        vec![
            Snapshot {
                elapsed_seconds: 3600.0,
                timestep: 12,
                values: vec![0.1, 0.2, 0.1, 0.0, 0.0],
            },
            Snapshot {
                elapsed_seconds: 7200.0,
                timestep: 24,
                values: vec![0.4, 0.4, 0.3, 0.0, 0.0],
            },
            Snapshot {
                elapsed_seconds: 10800.0,
                timestep: 36,
                values: vec![1.0, 1.0, 1.0, 1.0, 0.0],
            },
        ],
    )
}

fn output(root: &Path) -> OutputConfig {
    OutputConfig {
        directory: root.join("out"),
        neighbor_cache_dir: root.join("neighbors"),
        kml: true,
        geojson: true,
    }
}

fn event() -> EventConfig {
    EventConfig {
        typhoon_name: "Haiyan".into(),
        event_id: "7".into(),
        max_surge_id: "2".into(),
        reference_time: None,
    }
}

fn run_in(root: &Path, options: RunOptions) -> RunSummary {
    let mut mesh = mesh();
    let mut elevations = max_elevations();
    let mut towns = towns();
    let mut barangays = barangays();
    let mut provinces = provinces();
    let mut series = series();

    pipeline::run(
        "Leyte",
        RunInputs {
            mesh: &mut mesh,
            elevations: &mut elevations,
            towns: &mut towns,
            barangays: &mut barangays,
            provinces: Some(&mut provinces),
            time_series: Some(&mut series),
        },
        SearchSettings::default(),
        &output(root),
        &event(),
        options,
    )
    .expect("run should succeed")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[test]
fn test_outcomes_follow_record_order() {
    let dir = tempfile::tempdir().unwrap();
    let summary = run_in(dir.path(), RunOptions::default());

    let outcomes: Vec<(&str, RegionOutcome)> = summary
        .outcomes
        .iter()
        .map(|(name, o)| (name.as_str(), *o))
        .collect();
    assert_eq!(
        outcomes,
        vec![
            ("Palo", RegionOutcome::Warned),
            ("Tanauan", RegionOutcome::Warned),
            ("Dulag", RegionOutcome::Notified),
        ],
        "towns of other provinces are not evaluated"
    );
}

#[test]
fn test_warnings_carry_peak_and_sub_region() {
    let dir = tempfile::tempdir().unwrap();
    let summary = run_in(dir.path(), RunOptions::default());

    assert_eq!(summary.warnings.len(), 2);
    assert_eq!(summary.warnings[0].region, "Palo");
    assert_eq!(summary.warnings[0].severity, 1.5);
    assert_eq!(summary.warnings[0].sub_region.as_deref(), Some("Arado"));
    assert_eq!(summary.warnings[1].region, "Tanauan");
    assert_eq!(summary.warnings[1].severity, 2.2);
    assert_eq!(summary.warnings[1].sub_region.as_deref(), Some("Bislig"));
}

#[test]
fn test_consumption_invariant() {
    let dir = tempfile::tempdir().unwrap();
    let summary = run_in(dir.path(), RunOptions::default());

    let mut claimed: Vec<usize> = summary
        .warnings
        .iter()
        .flat_map(|w| w.claimed.iter().copied())
        .collect();
    let total_claimed = claimed.len();
    claimed.sort_unstable();
    claimed.dedup();

    assert_eq!(claimed.len(), total_claimed, "no node claimed twice");
    assert_eq!(summary.pool_remaining, mesh().nodes.len() - total_claimed);
    assert_eq!(summary.pool_remaining, 2);
}

#[test]
fn test_notifications_nearest_then_neighbors() {
    let dir = tempfile::tempdir().unwrap();
    let summary = run_in(dir.path(), RunOptions::default());

    assert_eq!(summary.notifications.len(), 3);
    match &summary.notifications[0] {
        Notification::Nearest(n) => {
            assert_eq!(n.region, "Dulag");
            assert_eq!(n.severity, 0.6);
            assert_eq!(n.direction, Direction::E);
            assert!((n.distance_m - 612.3).abs() < 2.0, "got {}", n.distance_m);
            assert_eq!(n.shoreline_severity, Some(0.6));
        }
        other => panic!("expected nearest notice, got {:?}", other),
    }
    match (&summary.notifications[1], &summary.notifications[2]) {
        (Notification::Neighbors(palo), Notification::Neighbors(tanauan)) => {
            assert_eq!(palo.region, "Palo");
            assert!(palo.neighbors.is_empty(), "Tanauan is warned itself");
            assert_eq!(tanauan.region, "Tanauan");
            assert_eq!(tanauan.neighbors, vec!["Dulag".to_string()]);
        }
        other => panic!("expected neighbor notices, got {:?}", other),
    }
}

#[test]
fn test_report_files_written() {
    let dir = tempfile::tempdir().unwrap();
    run_in(dir.path(), RunOptions::default());
    let out = dir.path().join("out");

    let warnings = fs::read_to_string(out.join("Leyte.warnings")).unwrap();
    assert_eq!(warnings, "Arado,Palo\t1.500\nBislig,Tanauan\t2.200\n");

    let notifications = fs::read_to_string(out.join("Leyte.notifications")).unwrap();
    let lines: Vec<&str> = notifications.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("Dulag\t0.600\t"));
    assert!(lines[0].ends_with("\tE\t0.600"));
    assert_eq!(lines[1], "Palo");
    assert_eq!(lines[2], "Tanauan\tDulag");

    let earliest = fs::read_to_string(out.join("Leyte.earliest")).unwrap();
    assert_eq!(
        earliest,
        "Arado,Palo,Leyte\t2013-11-08 01:00:00\nBislig,Tanauan,Leyte\t2013-11-08 02:00:00\n"
    );
}

#[test]
fn test_onset_records_per_warned_town() {
    let dir = tempfile::tempdir().unwrap();
    let summary = run_in(dir.path(), RunOptions::default());

    assert_eq!(summary.onsets.len(), 2);
    let (palo, place) = &summary.onsets[0];
    assert_eq!(palo.region, "Palo");
    assert_eq!(palo.node, 2);
    assert_eq!(palo.timestep, 12);
    assert_eq!(place, &vec!["Leyte".to_string(), "Palo".to_string(), "Arado".to_string()]);
    assert_eq!(summary.onsets[1].0.timestamp, Utc.with_ymd_and_hms(2013, 11, 8, 2, 0, 0).unwrap());
}

#[test]
fn test_neighbor_cache_created_then_reused() {
    let dir = tempfile::tempdir().unwrap();
    run_in(dir.path(), RunOptions::default());

    let cache = dir.path().join("neighbors").join("Leyte.neighbors");
    assert_eq!(
        fs::read_to_string(&cache).unwrap(),
        "Palo,Tanauan\nTanauan,Palo,Dulag\nDulag,Tanauan\n"
    );

    // A hand-edited cache is trusted as is.
    fs::write(&cache, "Palo,Dulag\nTanauan\n").unwrap();
    let summary = run_in(dir.path(), RunOptions::default());
    let neighbor_notices: Vec<_> = summary
        .notifications
        .iter()
        .filter_map(|n| match n {
            Notification::Neighbors(n) => Some(n),
            _ => None,
        })
        .collect();
    assert_eq!(neighbor_notices[0].neighbors, vec!["Dulag".to_string()]);
    assert!(neighbor_notices[1].neighbors.is_empty());
}

#[test]
fn test_maps_written_for_province_triangles() {
    let dir = tempfile::tempdir().unwrap();
    let summary = run_in(dir.path(), RunOptions::default());
    let out = dir.path().join("out");

    let kml = fs::read_to_string(out.join("maxelev_Haiyan_7_2_Leyte.kml")).unwrap();
    assert_eq!(kml.matches("<Placemark>").count(), 2);
    // Both triangles peak at 2.2 m.
    assert_eq!(kml.matches("<color>#a031d6ff</color>").count(), 2);

    let geojson: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(out.join("inundation_Haiyan_Leyte.geojson")).unwrap()).unwrap();
    assert_eq!(geojson["features"].as_array().unwrap().len(), 2);
    assert_eq!(geojson["features"][0]["properties"]["fill"], "#ffd631");

    assert!(summary.files.iter().any(|p| p.ends_with("maxelev_Haiyan_7_2_Leyte.kml")));
}

#[test]
fn test_skip_flags() {
    let dir = tempfile::tempdir().unwrap();
    let summary = run_in(
        dir.path(),
        RunOptions {
            skip_onset: true,
            skip_render: true,
        },
    );
    let out = dir.path().join("out");

    assert!(summary.onsets.is_empty());
    assert!(!out.join("Leyte.earliest").exists());
    assert!(!out.join("maxelev_Haiyan_7_2_Leyte.kml").exists());
    assert!(out.join("Leyte.warnings").exists());
    assert_eq!(summary.files.len(), 2);
}
