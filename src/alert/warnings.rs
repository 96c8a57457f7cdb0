//! Region evaluation against the node pool.
//!
//! Each region ends in one of three states:
//!
//! 1. no measured node near it, even after widening the search: nothing;
//! 2. nearby nodes, none inside: a nearest-point notification;
//! 3. nodes inside: a warning at the highest interior elevation, and those
//!    nodes leave the pool for good.
//!
//! Because of (3), results depend on region order. A region processed later
//! never sees nodes an earlier region claimed, so overlapping or nested
//! boundaries do not report the same surge peak twice. `evaluate_regions`
//! commits in slice order.

use std::collections::HashSet;

use rayon::prelude::*;

use crate::alert::neighbors::vertex_key;
use crate::analysis::candidates::{self, CandidateSet, SearchArea};
use crate::analysis::{join, NodePool};
use crate::config::SearchSettings;
use crate::geometry::{self, Point};
use crate::logging::{self, Stage};
use crate::model::{NearestNotice, Notification, Region, Result, Warning};

/// What evaluating one region produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionOutcome {
    Skipped,
    Notified,
    Warned,
}

/// Mutable state of one run: the pool plus everything emitted so far.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub pool: NodePool,
    pub settings: SearchSettings,
    pub warnings: Vec<Warning>,
    pub notifications: Vec<Notification>,
}

/// Read-only part of a region's evaluation, computed against the pool as it
/// stood before the batch.
struct Survey {
    area: SearchArea,
    first: CandidateSet,
    interior: Vec<bool>,
}

fn survey(region: &Region, pool: &NodePool, settings: &SearchSettings) -> Result<Survey> {
    let area = SearchArea::for_region(region)?;
    let first = candidates::prune(pool.live_nodes(), &area, settings.base_offset_m);
    let interior = join::region_membership(region, &first.positions);
    Ok(Survey {
        area,
        first,
        interior,
    })
}

impl RunContext {
    pub fn new(pool: NodePool, settings: SearchSettings) -> Self {
        Self {
            pool,
            settings,
            warnings: Vec::new(),
            notifications: Vec::new(),
        }
    }

    /// Evaluates regions in slice order.
    ///
    /// Surveys run in parallel against the current pool; claims are then
    /// applied one region at a time, so the result equals calling
    /// `evaluate_region` on each region in turn.
    ///
    /// `sub_regions` are searched for the location of each warning's peak.
    /// `outline` (the enclosing province) enables shoreline estimates.
    pub fn evaluate_regions(
        &mut self,
        regions: &[Region],
        sub_regions: &[Region],
        outline: Option<&Region>,
    ) -> Result<Vec<RegionOutcome>> {
        let surveys: Vec<Survey> = regions
            .par_iter()
            .map(|r| survey(r, &self.pool, &self.settings))
            .collect::<Result<Vec<_>>>()?;

        let outcomes: Vec<RegionOutcome> = regions
            .iter()
            .zip(surveys)
            .map(|(region, p)| self.commit(region, p, sub_regions, outline))
            .collect();

        let count = |o: RegionOutcome| outcomes.iter().filter(|&&x| x == o).count();
        logging::log_evaluation_summary(
            outcomes.len(),
            count(RegionOutcome::Warned),
            count(RegionOutcome::Notified),
            count(RegionOutcome::Skipped),
        );
        Ok(outcomes)
    }

    /// Evaluates a single region against the current pool.
    pub fn evaluate_region(
        &mut self,
        region: &Region,
        sub_regions: &[Region],
        outline: Option<&Region>,
    ) -> Result<RegionOutcome> {
        let p = survey(region, &self.pool, &self.settings)?;
        Ok(self.commit(region, p, sub_regions, outline))
    }

    fn commit(
        &mut self,
        region: &Region,
        survey: Survey,
        sub_regions: &[Region],
        outline: Option<&Region>,
    ) -> RegionOutcome {
        let Survey {
            area,
            mut first,
            interior,
        } = survey;

        // Earlier regions in the batch may have claimed some of these.
        let interior: Vec<bool> = first
            .indices
            .iter()
            .zip(interior)
            .filter(|(i, _)| self.pool.is_live(**i))
            .map(|(_, inside)| inside)
            .collect();
        first.retain_indices(|i| self.pool.is_live(i));

        if first.is_empty() {
            let extra = self.settings.base_offset_m + self.settings.radius_offset_m;
            let retry = candidates::prune(self.pool.live_nodes(), &area, extra);
            if retry.is_empty() {
                logging::debug(Stage::Warnings, Some(region.name()), "no nodes within search radius");
                return RegionOutcome::Skipped;
            }
            self.notify(region, &area, &retry, outline);
            return RegionOutcome::Notified;
        }

        let inside: Vec<usize> = (0..first.len()).filter(|&k| interior[k]).collect();
        if inside.is_empty() {
            self.notify(region, &area, &first, outline);
            RegionOutcome::Notified
        } else {
            self.warn(region, &first, &inside, sub_regions);
            RegionOutcome::Warned
        }
    }

    fn warn(&mut self, region: &Region, set: &CandidateSet, inside: &[usize], sub_regions: &[Region]) {
        let mut peak = inside[0];
        for &k in &inside[1..] {
            if set.elevations[k] > set.elevations[peak] {
                peak = k;
            }
        }

        let sub_region = join::locate_sub_region(sub_regions, region, set.positions[peak])
            .map(|r| r.name().to_string());
        let claimed: Vec<usize> = inside.iter().map(|&k| set.indices[k]).collect();
        let removed = self.pool.consume(&claimed);

        logging::debug(
            Stage::Warnings,
            Some(region.name()),
            &format!(
                "warning {:.3} m at node {}; {} nodes claimed, {} left in pool",
                set.elevations[peak],
                set.indices[peak],
                removed,
                self.pool.live_count()
            ),
        );

        self.warnings.push(Warning {
            region: region.name().to_string(),
            severity: set.elevations[peak],
            sub_region,
            claimed,
        });
    }

    fn notify(&mut self, region: &Region, area: &SearchArea, set: &CandidateSet, outline: Option<&Region>) {
        let Some(k) = set.nearest() else {
            return;
        };
        let shoreline_severity =
            outline.and_then(|o| shoreline_severity(region, o, set, self.settings.shoreline_radius_m));

        self.notifications.push(Notification::Nearest(NearestNotice {
            region: region.name().to_string(),
            severity: set.elevations[k],
            distance_m: set.distances_m[k],
            direction: geometry::direction(area.center, set.positions[k]),
            shoreline_severity,
        }));
    }
}

/// Highest candidate elevation within `reach_m` of the region's coastline.
///
/// The coastline is the set of region vertices that also appear, exactly,
/// in the enclosing outline. Returns `None` when the two share no vertex or
/// no candidate is close enough.
pub fn shoreline_severity(
    region: &Region,
    outline: &Region,
    set: &CandidateSet,
    reach_m: f64,
) -> Option<f64> {
    let coast: HashSet<_> = outline.vertices().map(vertex_key).collect();
    let shore: Vec<Point> = region
        .vertices()
        .filter(|p| coast.contains(&vertex_key(p)))
        .copied()
        .collect();
    if shore.is_empty() {
        return None;
    }

    (0..set.len())
        .filter(|&k| {
            shore
                .iter()
                .any(|s| geometry::geodesic_distance(*s, set.positions[k]) < reach_m)
        })
        .map(|k| set.elevations[k])
        .fold(None, |acc: Option<f64>, v| Some(acc.map_or(v, |m| m.max(v))))
}
