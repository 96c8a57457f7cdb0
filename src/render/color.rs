//! Elevation colour ramp.
//!
//! Piecewise-linear over break points -1..4 m, each segment half-open
//! `[k, k+1)`. Going up, the ramp runs blue, cyan, green, yellow, red,
//! magenta; water above 4 m saturates to pure magenta.

use crate::model::is_measured;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// KML colour string, `#aabbggrr`.
    pub fn kml(&self, alpha: u8) -> String {
        format!("#{:02x}{:02x}{:02x}{:02x}", alpha, self.b, self.g, self.r)
    }

    /// CSS-style `#rrggbb`.
    pub fn hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

const LOW: u8 = 49;
const HIGH: u8 = 255;
const SPAN: f64 = 206.0;

/// Channel offset for the fractional position `t` in `[0, 1)`.
fn step(t: f64) -> u8 {
    (t * SPAN).floor().clamp(0.0, SPAN - 1.0) as u8
}

/// Fill colour for a water elevation in meters, or `None` for the sentinel.
pub fn ramp(elevation: f64) -> Option<Rgb> {
    if !is_measured(elevation) {
        return None;
    }
    let v = elevation;
    let rgb = if v < -1.0 {
        Rgb::new(LOW, LOW, HIGH)
    } else if v < 0.0 {
        Rgb::new(LOW, LOW + step(v + 1.0), HIGH)
    } else if v < 1.0 {
        Rgb::new(LOW, HIGH, HIGH - step(v))
    } else if v < 2.0 {
        Rgb::new(LOW + step(v - 1.0), HIGH, LOW)
    } else if v < 3.0 {
        Rgb::new(HIGH, HIGH - step(v - 2.0), LOW)
    } else if v < 4.0 {
        Rgb::new(HIGH, LOW, LOW + step(v - 3.0))
    } else {
        Rgb::new(HIGH, 0, HIGH)
    };
    Some(rgb)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ELEVATION_SENTINEL;

    #[test]
    fn test_breakpoint_belongs_to_segment_starting_there() {
        assert_eq!(ramp(-1.0), Some(Rgb::new(49, 49, 255)));
        assert_eq!(ramp(0.0), Some(Rgb::new(49, 255, 255)));
        assert_eq!(ramp(1.0), Some(Rgb::new(49, 255, 49)));
        assert_eq!(ramp(2.0), Some(Rgb::new(255, 255, 49)));
        assert_eq!(ramp(3.0), Some(Rgb::new(255, 49, 49)));
    }

    #[test]
    fn test_saturates_at_four_meters() {
        assert_eq!(ramp(4.0), Some(Rgb::new(255, 0, 255)));
        assert_eq!(ramp(12.5), Some(Rgb::new(255, 0, 255)));
    }

    #[test]
    fn test_interpolates_within_segment() {
        // 0.5 * 206 = 103
        assert_eq!(ramp(0.5), Some(Rgb::new(49, 255, 152)));
        assert_eq!(ramp(-0.5), Some(Rgb::new(49, 152, 255)));
        assert_eq!(ramp(3.999), Some(Rgb::new(255, 49, 254)));
        assert_eq!(ramp(-7.0), Some(Rgb::new(49, 49, 255)));
    }

    #[test]
    fn test_sentinel_has_no_colour() {
        assert_eq!(ramp(ELEVATION_SENTINEL), None);
        assert_eq!(ramp(f64::NAN), None);
    }

    #[test]
    fn test_colour_strings() {
        let c = Rgb::new(49, 49, 255);
        assert_eq!(c.kml(0xa0), "#a0ff3131");
        assert_eq!(c.hex(), "#3131ff");
    }
}
