//! # Trigonometry Providers
//!
//! The ephemeris series only needs four primitives: sine, cosine, two-argument
//! arctangent and arcsine. They are supplied through the [`AngularMath`] trait
//! so the same series can run on exact `f64` math or on the fixed-point lookup
//! scheme used by small watch platforms.
//!
//! ## Providers
//! - [`ExactTrig`]: standard library transcendental functions (default)
//! - [`LookupTrig`]: 16-bit angle lookup with a small-angle arcsine substitute,
//!   for bit-compatible output with the fixed-point firmware
//!
//! The lookup provider's arcsine is the identity function. That is only
//! accurate for small arguments, so altitudes near the zenith come out low
//! (at most ~57° instead of 90°). This is a known accuracy boundary.

use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;
use std::sync::OnceLock;

/// Full circle in fixed-point angle units.
pub const TRIG_MAX_ANGLE: i32 = 0x10000;

/// Fixed-point value of 1.0 for sine/cosine lookups.
pub const TRIG_MAX_RATIO: i32 = 0xffff;

/// Scale applied to atan2 inputs before they are narrowed to `i16`.
const ATAN2_INPUT_SCALE: f64 = 8192.0;

/// Trigonometric primitives used by the coordinate series.
///
/// Angles are in radians. Implementations must satisfy the usual identities
/// within their resolution; none of them may panic on finite input.
pub trait AngularMath {
    fn sin(&self, angle: f64) -> f64;
    fn cos(&self, angle: f64) -> f64;
    /// Angle of the vector `(x, y)` in `(-π, π]`.
    fn atan2(&self, y: f64, x: f64) -> f64;
    /// Arcsine of a value already clamped to `[-1, 1]`.
    fn asin(&self, value: f64) -> f64;

    fn tan(&self, angle: f64) -> f64 {
        self.sin(angle) / self.cos(angle)
    }
}

/// Exact `f64` trigonometry.
#[derive(Clone, Copy, Debug, Default)]
pub struct ExactTrig;

impl AngularMath for ExactTrig {
    fn sin(&self, angle: f64) -> f64 {
        angle.sin()
    }

    fn cos(&self, angle: f64) -> f64 {
        angle.cos()
    }

    fn atan2(&self, y: f64, x: f64) -> f64 {
        y.atan2(x)
    }

    fn asin(&self, value: f64) -> f64 {
        value.asin()
    }

    fn tan(&self, angle: f64) -> f64 {
        angle.tan()
    }
}

/// Fixed-point lookup trigonometry.
///
/// Angles are quantized to [`TRIG_MAX_ANGLE`] units per turn and results to
/// [`TRIG_MAX_RATIO`] steps, matching the firmware's `sin_lookup`,
/// `cos_lookup` and `atan2_lookup`.
#[derive(Clone, Copy, Debug, Default)]
pub struct LookupTrig;

/// Quarter-wave sine table, `TRIG_MAX_ANGLE / 4 + 1` entries.
fn quarter_wave() -> &'static [i32] {
    static TABLE: OnceLock<Vec<i32>> = OnceLock::new();
    TABLE.get_or_init(|| {
        let quarter = TRIG_MAX_ANGLE / 4;
        (0..=quarter)
            .map(|i| {
                let angle = i as f64 * TAU / TRIG_MAX_ANGLE as f64;
                (angle.sin() * TRIG_MAX_RATIO as f64).round() as i32
            })
            .collect()
    })
}

/// Firmware-style `sin_lookup` over fixed-point angle units.
pub fn sin_lookup(angle: i32) -> i32 {
    let quarter = TRIG_MAX_ANGLE / 4;
    let table = quarter_wave();
    let a = angle.rem_euclid(TRIG_MAX_ANGLE);
    match a / quarter {
        0 => table[a as usize],
        1 => table[(2 * quarter - a) as usize],
        2 => -table[(a - 2 * quarter) as usize],
        _ => -table[(TRIG_MAX_ANGLE - a) as usize],
    }
}

/// Firmware-style `cos_lookup` over fixed-point angle units.
pub fn cos_lookup(angle: i32) -> i32 {
    sin_lookup(angle + TRIG_MAX_ANGLE / 4)
}

fn to_lookup_angle(radians: f64) -> i32 {
    // Truncation toward zero, as the firmware's float-to-int cast does.
    let units = radians * TRIG_MAX_ANGLE as f64 / TAU;
    units.clamp(i32::MIN as f64, i32::MAX as f64) as i32
}

fn narrow_atan2_input(value: f64) -> i16 {
    (ATAN2_INPUT_SCALE * value).clamp(i16::MIN as f64, i16::MAX as f64) as i16
}

impl AngularMath for LookupTrig {
    fn sin(&self, angle: f64) -> f64 {
        sin_lookup(to_lookup_angle(angle)) as f64 / TRIG_MAX_RATIO as f64
    }

    fn cos(&self, angle: f64) -> f64 {
        cos_lookup(to_lookup_angle(angle)) as f64 / TRIG_MAX_RATIO as f64
    }

    fn atan2(&self, y: f64, x: f64) -> f64 {
        if y.abs() > 4.0 || x.abs() > 4.0 {
            log::debug!("atan2 input saturates fixed-point range: y={y:.3} x={x:.3}");
        }
        let yq = narrow_atan2_input(y) as f64;
        let xq = narrow_atan2_input(x) as f64;
        let units = (yq.atan2(xq) * TRIG_MAX_ANGLE as f64 / TAU).round();
        units * TAU / TRIG_MAX_ANGLE as f64
    }

    fn asin(&self, value: f64) -> f64 {
        // Small-angle substitute.
        value
    }
}

/// Which trigonometry provider the engine runs on.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TrigMode {
    #[default]
    Exact,
    Lookup,
}

/// Provider selected at runtime from [`TrigMode`].
#[derive(Clone, Copy, Debug)]
pub enum Trig {
    Exact(ExactTrig),
    Lookup(LookupTrig),
}

impl From<TrigMode> for Trig {
    fn from(mode: TrigMode) -> Self {
        match mode {
            TrigMode::Exact => Trig::Exact(ExactTrig),
            TrigMode::Lookup => Trig::Lookup(LookupTrig),
        }
    }
}

impl Default for Trig {
    fn default() -> Self {
        Trig::Exact(ExactTrig)
    }
}

impl AngularMath for Trig {
    fn sin(&self, angle: f64) -> f64 {
        match self {
            Trig::Exact(t) => t.sin(angle),
            Trig::Lookup(t) => t.sin(angle),
        }
    }

    fn cos(&self, angle: f64) -> f64 {
        match self {
            Trig::Exact(t) => t.cos(angle),
            Trig::Lookup(t) => t.cos(angle),
        }
    }

    fn atan2(&self, y: f64, x: f64) -> f64 {
        match self {
            Trig::Exact(t) => t.atan2(y, x),
            Trig::Lookup(t) => t.atan2(y, x),
        }
    }

    fn asin(&self, value: f64) -> f64 {
        match self {
            Trig::Exact(t) => t.asin(value),
            Trig::Lookup(t) => t.asin(value),
        }
    }

    fn tan(&self, angle: f64) -> f64 {
        match self {
            Trig::Exact(t) => t.tan(angle),
            Trig::Lookup(t) => t.tan(angle),
        }
    }
}
