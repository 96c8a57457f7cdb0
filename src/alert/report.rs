/// Text products for downstream messaging
///
/// All files are tab-separated, one record per line, named after the scope
/// (province) they cover:
///
/// - `<scope>.warnings`      `sub_region,region<TAB>severity`
/// - `<scope>.notifications` `region<TAB>severity<TAB>distance<TAB>direction[<TAB>shoreline]`
///                           or `region<TAB>neighbor1<TAB>neighbor2...`
/// - `<scope>.earliest`      `barangay,town,province<TAB>YYYY-MM-DD HH:MM:SS`

use std::fs;
use std::path::{Path, PathBuf};

use crate::model::{EarliestSurge, Notification, Result, SurgeError, Warning};

pub fn warning_line(w: &Warning) -> String {
    format!(
        "{},{}\t{:.3}",
        w.sub_region.as_deref().unwrap_or(""),
        w.region,
        w.severity
    )
}

pub fn notification_line(n: &Notification) -> String {
    match n {
        Notification::Nearest(n) => {
            let mut line = format!(
                "{}\t{:.3}\t{:.1}\t{}",
                n.region, n.severity, n.distance_m, n.direction
            );
            if let Some(shore) = n.shoreline_severity {
                line.push_str(&format!("\t{:.3}", shore));
            }
            line
        }
        Notification::Neighbors(n) => {
            let mut fields = vec![n.region.as_str()];
            fields.extend(n.neighbors.iter().map(String::as_str));
            fields.join("\t")
        }
    }
}

/// `place` is a hierarchy path, coarsest first; it is written finest first.
pub fn earliest_line(surge: &EarliestSurge, place: &[String]) -> String {
    let names: Vec<&str> = place.iter().rev().map(String::as_str).collect();
    format!("{}\t{}", names.join(","), surge.timestamp.format("%Y-%m-%d %H:%M:%S"))
}

// ---------------------------------------------------------------------------
// Files
// ---------------------------------------------------------------------------

pub fn report_path(dir: &Path, scope: &str, extension: &str) -> PathBuf {
    dir.join(format!("{}.{}", scope, extension))
}

fn write_lines(path: &Path, lines: impl IntoIterator<Item = String>) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| SurgeError::io(parent, e))?;
    }
    let mut text = String::new();
    for line in lines {
        text.push_str(&line);
        text.push('\n');
    }
    fs::write(path, text).map_err(|e| SurgeError::io(path, e))
}

pub fn write_warnings(dir: &Path, scope: &str, warnings: &[Warning]) -> Result<PathBuf> {
    let path = report_path(dir, scope, "warnings");
    write_lines(&path, warnings.iter().map(warning_line))?;
    Ok(path)
}

pub fn write_notifications(dir: &Path, scope: &str, notifications: &[Notification]) -> Result<PathBuf> {
    let path = report_path(dir, scope, "notifications");
    write_lines(&path, notifications.iter().map(notification_line))?;
    Ok(path)
}

/// Each surge is paired with the hierarchy path of the place it was found.
pub fn write_earliest(dir: &Path, scope: &str, onsets: &[(EarliestSurge, Vec<String>)]) -> Result<PathBuf> {
    let path = report_path(dir, scope, "earliest");
    write_lines(&path, onsets.iter().map(|(s, place)| earliest_line(s, place)))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;
    use crate::model::{Direction, NearestNotice, NeighborNotice};
    use chrono::{TimeZone, Utc};

    fn warning(sub: Option<&str>) -> Warning {
        Warning {
            region: "Palo".into(),
            severity: 2.34567,
            sub_region: sub.map(String::from),
            claimed: vec![4, 5],
        }
    }

    #[test]
    fn test_warning_line() {
        assert_eq!(warning_line(&warning(Some("San Joaquin"))), "San Joaquin,Palo\t2.346");
        assert_eq!(warning_line(&warning(None)), ",Palo\t2.346");
    }

    #[test]
    fn test_nearest_notification_line() {
        let mut notice = NearestNotice {
            region: "Dulag".into(),
            severity: 0.5,
            distance_m: 1234.56,
            direction: Direction::NE,
            shoreline_severity: None,
        };
        assert_eq!(
            notification_line(&Notification::Nearest(notice.clone())),
            "Dulag\t0.500\t1234.6\tNE"
        );
        notice.shoreline_severity = Some(0.75);
        assert_eq!(
            notification_line(&Notification::Nearest(notice)),
            "Dulag\t0.500\t1234.6\tNE\t0.750"
        );
    }

    #[test]
    fn test_neighbor_notification_line() {
        let n = Notification::Neighbors(NeighborNotice {
            region: "Palo".into(),
            neighbors: vec!["Tanauan".into(), "Pastrana".into()],
        });
        assert_eq!(notification_line(&n), "Palo\tTanauan\tPastrana");
    }

    #[test]
    fn test_earliest_file_lists_finest_name_first() {
        let surge = EarliestSurge {
            region: "Palo".into(),
            node: 7,
            location: Point::new(125.0, 11.1),
            timestamp: Utc.with_ymd_and_hms(2013, 11, 8, 4, 30, 0).unwrap(),
            elapsed_seconds: 0.0,
            timestep: 0,
        };
        let place = vec!["Leyte".to_string(), "Palo".to_string(), "Arado".to_string()];
        let dir = tempfile::tempdir().unwrap();

        let path = write_earliest(dir.path(), "Leyte", &[(surge, place)]).unwrap();

        assert_eq!(path, dir.path().join("Leyte.earliest"));
        assert_eq!(
            fs::read_to_string(path).unwrap(),
            "Arado,Palo,Leyte\t2013-11-08 04:30:00\n"
        );
    }

    #[test]
    fn test_writers_create_output_directory() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        let path = write_warnings(&out, "Leyte", &[warning(Some("Arado"))]).unwrap();
        assert_eq!(fs::read_to_string(path).unwrap(), "Arado,Palo\t2.346\n");

        let path = write_notifications(&out, "Leyte", &[]).unwrap();
        assert_eq!(fs::read_to_string(path).unwrap(), "");
    }
}
