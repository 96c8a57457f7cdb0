//! Earliest surge onset per flagged region.
//!
//! The time series is streamed once, in order. For every region still
//! waiting, each snapshot is checked against the region's nodes (ascending
//! node number) and the first node above the onset threshold fixes that
//! region's record. Streaming stops as soon as no region is waiting.

use chrono::{DateTime, Duration, Utc};
use rayon::prelude::*;

use crate::alert::thresholds::exceeds_onset;
use crate::analysis::{candidates, join, NodePool, SearchArea};
use crate::config::SearchSettings;
use crate::ingest::TimeSeriesSource;
use crate::logging::{self, Stage};
use crate::model::{EarliestSurge, Region, Result, SurgeError};

/// A region together with the mesh nodes lying inside it.
#[derive(Debug, Clone, PartialEq)]
pub struct FlaggedRegion {
    pub name: String,
    /// 1-based node numbers, ascending.
    pub nodes: Vec<usize>,
}

/// Finds the nodes inside each region, consumed or not.
///
/// Measured nodes only: a node that never got wet cannot start a surge.
pub fn flag_regions(
    regions: &[Region],
    pool: &NodePool,
    settings: &SearchSettings,
) -> Result<Vec<FlaggedRegion>> {
    regions
        .par_iter()
        .map(|region| {
            let area = SearchArea::for_region(region)?;
            let set = candidates::prune(pool.nodes(), &area, settings.base_offset_m);
            let inside = join::region_membership(region, &set.positions);
            let nodes = set
                .indices
                .iter()
                .zip(inside)
                .filter_map(|(&i, hit)| hit.then_some(i))
                .collect();
            Ok(FlaggedRegion {
                name: region.name().to_string(),
                nodes,
            })
        })
        .collect()
}

/// Scans `source` for the first onset in each flagged region.
///
/// Regions without nodes are logged as out of range and get no record; if
/// no region has nodes the series is not read at all. Records come back in
/// region order.
pub fn scan_earliest_onset<S: TimeSeriesSource + ?Sized>(
    source: &mut S,
    regions: &[FlaggedRegion],
    pool: &NodePool,
) -> Result<Vec<EarliestSurge>> {
    let mut pending: Vec<usize> = Vec::new();
    for (k, region) in regions.iter().enumerate() {
        if region.nodes.is_empty() {
            logging::warn(Stage::Onset, Some(&region.name), "out of range: no mesh nodes inside");
        } else {
            pending.push(k);
        }
    }
    if pending.is_empty() {
        logging::warn(Stage::Onset, None, "no flagged region has mesh nodes, scan skipped");
        return Ok(Vec::new());
    }

    let reference = source.reference_time();
    let mut found: Vec<Option<EarliestSurge>> = vec![None; regions.len()];

    while !pending.is_empty() {
        let Some(snapshot) = source.next_snapshot()? else {
            break;
        };
        if snapshot.values.len() != pool.len() {
            return Err(SurgeError::Inconsistent(format!(
                "time step {} has {} values for a {}-node mesh",
                snapshot.timestep,
                snapshot.values.len(),
                pool.len()
            )));
        }

        let mut still_pending = Vec::with_capacity(pending.len());
        for &k in &pending {
            let region = &regions[k];
            let hit = region.nodes.iter().copied().find(|&n| {
                n.checked_sub(1)
                    .and_then(|i| snapshot.values.get(i))
                    .is_some_and(|&v| exceeds_onset(v))
            });
            let Some(node) = hit.and_then(|n| pool.get(n)) else {
                still_pending.push(k);
                continue;
            };

            let surge = EarliestSurge {
                region: region.name.clone(),
                node: node.index,
                location: node.position,
                timestamp: onset_time(reference, snapshot.elapsed_seconds, snapshot.timestep)?,
                elapsed_seconds: snapshot.elapsed_seconds,
                timestep: snapshot.timestep,
            };
            logging::info(
                Stage::Onset,
                Some(&region.name),
                &format!("earliest surge at node {} on {}", node.index, surge.timestamp.format("%Y-%m-%d %H:%M:%S")),
            );
            found[k] = Some(surge);
        }
        pending = still_pending;
    }

    for &k in &pending {
        logging::debug(Stage::Onset, Some(&regions[k].name), "never exceeded the onset threshold");
    }
    Ok(found.into_iter().flatten().collect())
}

/// Reference time plus a record's elapsed seconds, to the millisecond.
fn onset_time(reference: DateTime<Utc>, elapsed_seconds: f64, timestep: u64) -> Result<DateTime<Utc>> {
    let malformed = || {
        SurgeError::malformed(
            format!("time step {}", timestep),
            0,
            format!("elapsed time {} s is outside the representable range", elapsed_seconds),
        )
    };
    if !elapsed_seconds.is_finite() {
        return Err(malformed());
    }
    Duration::try_milliseconds((elapsed_seconds * 1000.0).round() as i64)
        .and_then(|offset| reference.checked_add_signed(offset))
        .ok_or_else(malformed)
}

/// The sub-region (under `parents`, matched by name) holding each record's
/// location, in record order.
pub fn locate_onsets<'a>(
    surges: &[EarliestSurge],
    parents: &[Region],
    sub_regions: &'a [Region],
) -> Vec<Option<&'a Region>> {
    surges
        .iter()
        .map(|s| {
            parents
                .iter()
                .find(|p| p.name() == s.region)
                .and_then(|p| join::locate_sub_region(sub_regions, p, s.location))
        })
        .collect()
}
