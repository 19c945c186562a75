//! Moon-phase clock
//!
//! Lunar age from a fixed synodic period and a reference new moon.
//! Accuracy: about ±1 day, since the real synodic month varies by several
//! hours around its mean.

use serde::{Deserialize, Serialize};

/// A known new moon: 2016-11-29T12:19:25Z.
pub const REFERENCE_NEW_MOON: i64 = 1_480_421_975;

/// Mean synodic month in seconds (29.530588 days).
pub const SYNODIC_PERIOD_SECS: i64 = 2_551_443;

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Age of the current lunation in days, in `[0, 29.53)`.
///
/// Uses floor modulo so instants before the reference new moon still yield a
/// non-negative age.
pub fn moon_phase(timestamp: i64) -> f64 {
    (timestamp - REFERENCE_NEW_MOON).rem_euclid(SYNODIC_PERIOD_SECS) as f64 / SECONDS_PER_DAY
}

/// Fraction of the synodic cycle elapsed, in `[0, 1)`.
pub fn cycle_fraction(timestamp: i64) -> f64 {
    moon_phase(timestamp) * SECONDS_PER_DAY / SYNODIC_PERIOD_SECS as f64
}

/// Whole days into the lunation, 0 to 29.
pub fn lunar_day(timestamp: i64) -> u32 {
    moon_phase(timestamp) as u32
}

/// Moon icon bucket, one per stretch of the lunar cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MoonImage {
    New,
    WaxingCrescent,
    FirstQuarter,
    WaxingGibbous,
    Full,
    WaningGibbous,
    LastQuarter,
    WaningCrescent,
    Old,
}

impl MoonImage {
    /// Bucket edges at days 3, 6, 10, 13, 16, 19, 23 and 26.
    pub fn for_lunar_day(day: u32) -> Self {
        match day {
            0..=2 => MoonImage::New,
            3..=5 => MoonImage::WaxingCrescent,
            6..=9 => MoonImage::FirstQuarter,
            10..=12 => MoonImage::WaxingGibbous,
            13..=15 => MoonImage::Full,
            16..=18 => MoonImage::WaningGibbous,
            19..=22 => MoonImage::LastQuarter,
            23..=25 => MoonImage::WaningCrescent,
            _ => MoonImage::Old,
        }
    }

    pub fn at(timestamp: i64) -> Self {
        Self::for_lunar_day(lunar_day(timestamp))
    }

    /// Zero-based resource index, 0 to 8.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Single-character glyph for terminal output.
    pub fn glyph(self) -> char {
        match self {
            MoonImage::New | MoonImage::Old => '●',
            MoonImage::WaxingCrescent | MoonImage::WaxingGibbous => '◑',
            MoonImage::FirstQuarter => '◐',
            MoonImage::Full => '○',
            MoonImage::WaningGibbous | MoonImage::WaningCrescent => '◐',
            MoonImage::LastQuarter => '◑',
        }
    }
}
