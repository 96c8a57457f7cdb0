//! Surge onset threshold.
//!
//! A node is considered to have started flooding once its water elevation
//! rises above six inches.

use crate::model::is_measured;

/// Six inches, in meters.
pub const ONSET_THRESHOLD_M: f64 = 0.1524;

/// `true` if `elevation` is a measurement strictly above the onset threshold.
pub fn exceeds_onset(elevation: f64) -> bool {
    is_measured(elevation) && elevation > ONSET_THRESHOLD_M
}
