//! # SkyPath Core Library
//!
//! This library computes where the sun and moon sit in the sky for an observer,
//! derives the lunar phase, and keeps a cached table of hourly altitudes used to
//! draw a 24-hour sky-path graph on a small display.
//!
//! ## Design Philosophy
//!
//! ### Low-precision, low-cost
//! - **Simplified series**: solar and lunar positions use short analytic series
//!   (roughly one degree of error), with no nutation, parallax or refraction
//! - **Fixed-size tables**: the hourly tables are `[f64; 25]` arrays, hours 0 to
//!   24 of the local day, allocated once and regenerated wholesale
//! - **Cached**: the 2×25 trigonometric evaluations run at most once an hour
//!   unless the observer moves or the lunar side flips
//!
//! ### Data Flow
//! 1. **Settings**: location and debug time-shift arrive from the companion
//!    device and invalidate the cache
//! 2. **Recompute**: [`sky_path::SkyPathCache`] rebuilds the tables through
//!    [`ephemeris`] and [`lunar`]
//! 3. **Redraw**: every minute the [`engine::SkyEngine`] builds a frame via
//!    [`interpolate`] and the [`renderer`] draws it
//!
//! ## Core Types
//! - [`ObserverLocation`]: latitude/longitude in degrees, west negative
//! - [`CelestialPosition`]: azimuth/altitude pair in degrees
//! - [`HourlyTable`]: 25 hourly samples anchored at local midnight

use serde::{Deserialize, Serialize};
use std::ops::Index;

// Module declarations
pub mod config;
pub mod display;
pub mod engine;
pub mod ephemeris;
pub mod interpolate;
pub mod lunar;
pub mod renderer;
pub mod settings;
pub mod sky_path;
pub mod state;
pub mod trig;

/// Number of hourly samples in a table: hours 0 through 24 inclusive.
pub const HOURLY_SAMPLES: usize = 25;

/// Observer position on Earth.
///
/// Longitude follows the "west negative" convention; the astronomical series
/// negate it internally.
///
/// # Example
/// ```
/// use skypath_lib::ObserverLocation;
///
/// let fairbanks = ObserverLocation { latitude: 64.8, longitude: -147.0 };
/// assert!(fairbanks.longitude < 0.0);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ObserverLocation {
    /// Degrees, + north
    pub latitude: f64,
    /// Degrees, + east
    pub longitude: f64,
}

impl Default for ObserverLocation {
    fn default() -> Self {
        ObserverLocation {
            latitude: 64.8,
            longitude: -147.0,
        }
    }
}

/// Horizon-relative position of a body.
///
/// `azimuth` is in `[0, 360)` and `altitude` in `[-90, 90]`, both degrees.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CelestialPosition {
    pub azimuth: f64,
    pub altitude: f64,
}

/// Hourly samples for one body, indexed 0..=24 from local midnight.
///
/// Index 24 is the following midnight and is only used as the far end of the
/// last interpolation interval.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HourlyTable([f64; HOURLY_SAMPLES]);

impl HourlyTable {
    pub fn new(samples: [f64; HOURLY_SAMPLES]) -> Self {
        HourlyTable(samples)
    }

    /// Samples at `hour` and `hour + 1`. `hour` is clamped to 0..=23.
    pub fn interval(&self, hour: usize) -> (f64, f64) {
        let h = hour.min(HOURLY_SAMPLES - 2);
        (self.0[h], self.0[h + 1])
    }

    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.0.iter().copied()
    }

    pub fn as_array(&self) -> &[f64; HOURLY_SAMPLES] {
        &self.0
    }
}

impl Default for HourlyTable {
    fn default() -> Self {
        HourlyTable([0.0; HOURLY_SAMPLES])
    }
}

impl Index<usize> for HourlyTable {
    type Output = f64;

    fn index(&self, hour: usize) -> &f64 {
        &self.0[hour]
    }
}

/// Round half away from zero to the nearest integer.
///
/// `2.5 → 3`, `-2.5 → -3`. Used for every integer rounding in the engine.
pub fn round_half_away(value: f64) -> i32 {
    value.round() as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_half_away_from_zero() {
        assert_eq!(round_half_away(2.5), 3);
        assert_eq!(round_half_away(-2.5), -3);
        assert_eq!(round_half_away(2.49), 2);
        assert_eq!(round_half_away(-0.4), 0);
    }

    #[test]
    fn test_hourly_table_interval_clamps() {
        let mut samples = [0.0; HOURLY_SAMPLES];
        for (i, s) in samples.iter_mut().enumerate() {
            *s = i as f64;
        }
        let table = HourlyTable::new(samples);
        assert_eq!(table.interval(0), (0.0, 1.0));
        assert_eq!(table.interval(23), (23.0, 24.0));
        assert_eq!(table.interval(24), (23.0, 24.0));
        assert_eq!(table[24], 24.0);
        assert_eq!(table.iter().count(), HOURLY_SAMPLES);
    }

    #[test]
    fn test_default_location_is_fairbanks() {
        let loc = ObserverLocation::default();
        assert_eq!(loc.latitude, 64.8);
        assert_eq!(loc.longitude, -147.0);
    }
}
