//! # Sky-Path Cache
//!
//! Owns the hourly altitude tables for the sun and moon over the current local
//! day, together with the lunar alignment used to place the moon's track on
//! the sun's hour axis.
//!
//! ## Caching Strategy
//!
//! Building the tables costs 2 × 25 runs of the trigonometric series. Redraws
//! happen every minute, so the tables are only rebuilt when the cache is stale.
//! That happens when any of these holds:
//! - **Age**: more than `max_age_secs` (default 3600) since the last compute
//! - **Location**: latitude or longitude moved by more than
//!   `location_tolerance_deg` (default 0.5°)
//! - **Lunar side**: the moon's hour-axis reference crossed the sun's
//! - **Explicit**: [`SkyPathCache::invalidate`] was called (startup, settings
//!   update, daily 00:01 tick)
//!
//! Otherwise [`SkyPathCache::recompute`] returns immediately.
//!
//! ## Lunar Alignment
//!
//! The moon rises roughly 50 minutes later each day, so its track is offset
//! from the sun's by the fraction of the synodic cycle elapsed. The moon table
//! is sampled at a time-shifted instant, so that when it is drawn on the same
//! hour axis its track sits at the moon's current phase offset from the sun.

use crate::ephemeris::{altitude_deg, Body};
use crate::lunar::cycle_fraction;
use crate::trig::{AngularMath, Trig};
use crate::{round_half_away, HourlyTable, ObserverLocation, HOURLY_SAMPLES};
use chrono::{DateTime, Duration, TimeZone, Timelike};
use log::debug;

const SECONDS_PER_HOUR: i64 = 3600;
const SECONDS_PER_DAY: i64 = 86_400;

/// Where the moon's phase-derived hour sits relative to the current hour.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LunarSide {
    /// The lunar hour wrapped past midnight and is numerically later than the
    /// solar hour (`-1`).
    Leading,
    /// The lunar hour is at or before the solar hour (`+1`).
    Trailing,
}

impl LunarSide {
    pub fn sign(self) -> i32 {
        match self {
            LunarSide::Leading => -1,
            LunarSide::Trailing => 1,
        }
    }
}

/// Phase shift of the moon's hourly samples relative to the sun's hour axis.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LunarAlignment {
    /// Whole hours the moon samples are shifted back in time.
    pub offset_hour: i32,
    /// Residual display shift in hours, within `(-1, 1)`.
    pub fine_shift: f64,
    pub side: LunarSide,
    /// Calendar-day correction applied when sampling: -1, 0 or +1.
    pub day_shift: i32,
}

impl Default for LunarAlignment {
    fn default() -> Self {
        LunarAlignment {
            offset_hour: 0,
            fine_shift: 0.0,
            side: LunarSide::Trailing,
            day_shift: 0,
        }
    }
}

impl LunarAlignment {
    /// Alignment for the given local instant. Cheap: no trigonometry.
    pub fn at<Tz: TimeZone>(now: &DateTime<Tz>) -> Self {
        let solar_display_hour = now.hour() as f64 + now.minute() as f64 / 60.0;
        let phase_hours = 24.0 * cycle_fraction(now.timestamp());
        let lunar_display_hour = (solar_display_hour - phase_hours).rem_euclid(24.0);

        let side = if lunar_display_hour > solar_display_hour {
            LunarSide::Leading
        } else {
            LunarSide::Trailing
        };

        // fold into (-12, 12]
        let mut fine_shift = -phase_hours;
        if fine_shift < -12.0 {
            fine_shift += 24.0;
        }

        let day_shift = match side {
            LunarSide::Leading if fine_shift < 0.0 => -1,
            LunarSide::Trailing if fine_shift > 0.0 => 1,
            _ => 0,
        };

        let offset_hour = round_half_away(fine_shift);
        fine_shift -= offset_hour as f64;

        LunarAlignment {
            offset_hour,
            fine_shift,
            side,
            day_shift,
        }
    }

    /// Offset in seconds from a solar sample instant to its lunar counterpart.
    pub fn sample_offset_secs(&self) -> i64 {
        self.day_shift as i64 * SECONDS_PER_DAY - self.offset_hour as i64 * SECONDS_PER_HOUR
    }
}

/// Memo consulted by the invalidation predicate.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CacheValidity {
    pub last_compute_time: i64,
    pub last_latitude: f64,
    pub last_longitude: f64,
    pub last_side: LunarSide,
}

/// Thresholds for the invalidation predicate.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CachePolicy {
    pub max_age_secs: i64,
    pub location_tolerance_deg: f64,
}

impl Default for CachePolicy {
    fn default() -> Self {
        CachePolicy {
            max_age_secs: 3600,
            location_tolerance_deg: 0.5,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CacheState {
    Valid,
    Stale,
}

/// Local midnight at the start of `now`'s calendar day.
///
/// Falls back to subtracting the seconds since midnight when midnight does not
/// exist locally (a DST gap).
pub fn local_midnight<Tz: TimeZone>(now: &DateTime<Tz>) -> DateTime<Tz> {
    now.date_naive()
        .and_hms_opt(0, 0, 0)
        .and_then(|naive| now.timezone().from_local_datetime(&naive).earliest())
        .unwrap_or_else(|| {
            now.clone() - Duration::seconds(now.num_seconds_from_midnight() as i64)
        })
}

/// Cached hourly sky paths for the current local day.
pub struct SkyPathCache<T: AngularMath = Trig> {
    trig: T,
    policy: CachePolicy,
    solar: HourlyTable,
    lunar: HourlyTable,
    alignment: LunarAlignment,
    validity: Option<CacheValidity>,
    computations: u64,
}

impl<T: AngularMath> SkyPathCache<T> {
    /// New cache in the stale state; the first `recompute` always runs.
    pub fn new(trig: T, policy: CachePolicy) -> Self {
        SkyPathCache {
            trig,
            policy,
            solar: HourlyTable::default(),
            lunar: HourlyTable::default(),
            alignment: LunarAlignment::default(),
            validity: None,
            computations: 0,
        }
    }

    pub fn invalidate(&mut self) {
        self.validity = None;
    }

    pub fn is_stale<Tz: TimeZone>(&self, now: &DateTime<Tz>, location: &ObserverLocation) -> bool {
        let Some(memo) = self.validity else {
            return true;
        };

        // abs() also catches the clock stepping backwards
        if (now.timestamp() - memo.last_compute_time).abs() > self.policy.max_age_secs {
            return true;
        }

        let tol = self.policy.location_tolerance_deg;
        if (location.latitude - memo.last_latitude).abs() > tol
            || (location.longitude - memo.last_longitude).abs() > tol
        {
            return true;
        }

        LunarAlignment::at(now).side != memo.last_side
    }

    pub fn state<Tz: TimeZone>(&self, now: &DateTime<Tz>, location: &ObserverLocation) -> CacheState {
        if self.is_stale(now, location) {
            CacheState::Stale
        } else {
            CacheState::Valid
        }
    }

    /// Rebuild the tables if stale. Returns whether any work was done.
    pub fn recompute<Tz: TimeZone>(&mut self, now: &DateTime<Tz>, location: &ObserverLocation) -> bool {
        if !self.is_stale(now, location) {
            return false;
        }

        let alignment = LunarAlignment::at(now);
        let midnight = local_midnight(now).timestamp();
        let lunar_offset = alignment.sample_offset_secs();

        let mut solar = [0.0; HOURLY_SAMPLES];
        let mut lunar = [0.0; HOURLY_SAMPLES];
        for (hour, (sun_alt, moon_alt)) in solar.iter_mut().zip(lunar.iter_mut()).enumerate() {
            let t = midnight + hour as i64 * SECONDS_PER_HOUR;
            *sun_alt = altitude_deg(&self.trig, Body::Sun, t, location);
            *moon_alt = altitude_deg(&self.trig, Body::Moon, t + lunar_offset, location);
        }

        self.solar = HourlyTable::new(solar);
        self.lunar = HourlyTable::new(lunar);
        self.alignment = alignment;
        self.validity = Some(CacheValidity {
            last_compute_time: now.timestamp(),
            last_latitude: location.latitude,
            last_longitude: location.longitude,
            last_side: alignment.side,
        });
        self.computations += 1;

        debug!(
            "Re-calculated sky paths at lat {:.1} lon {:.1}: offset {}h fine {:.2}h side {} day {}",
            location.latitude,
            location.longitude,
            alignment.offset_hour,
            alignment.fine_shift,
            alignment.side.sign(),
            alignment.day_shift
        );
        true
    }

    pub fn solar(&self) -> &HourlyTable {
        &self.solar
    }

    pub fn lunar(&self) -> &HourlyTable {
        &self.lunar
    }

    pub fn alignment(&self) -> &LunarAlignment {
        &self.alignment
    }

    pub fn validity(&self) -> Option<&CacheValidity> {
        self.validity.as_ref()
    }

    pub fn policy(&self) -> &CachePolicy {
        &self.policy
    }

    pub fn trig(&self) -> &T {
        &self.trig
    }

    /// How many times the tables have actually been rebuilt.
    pub fn computations(&self) -> u64 {
        self.computations
    }
}
