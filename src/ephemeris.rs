//! # Low-precision Sun & Moon Ephemeris
//!
//! Horizontal coordinates of the sun and moon from a Unix timestamp and an
//! observer location. The formulas are the short analytic series popularized
//! by SunCalc (after http://aa.quae.nl/en/reken/zonpositie.html and
//! http://aa.quae.nl/en/reken/hemelpositie.html).
//!
//! Accuracy: about one degree. No nutation, parallax or refraction.
//!
//! Every function is generic over [`AngularMath`], so the same series runs on
//! exact or fixed-point trigonometry.
//!
//! Near the poles of the equatorial frame (`dec → ±90°`), `tan(dec)` in the
//! azimuth formula grows without bound. The arctangent saturates rather than
//! failing, so the azimuth just loses accuracy there.

use crate::trig::AngularMath;
use crate::{CelestialPosition, ObserverLocation};
use std::f64::consts::PI;

/// Unix timestamp of the J2000 epoch day boundary (2000-01-01T00:00Z).
pub const J2000_UNIX: i64 = 946_684_800;

pub const SECONDS_PER_DAY: f64 = 86_400.0;

/// Obliquity of the ecliptic, radians.
const OBLIQUITY: f64 = 23.4397 * PI / 180.0;

/// Perihelion of the Earth, radians.
const PERIHELION: f64 = 102.9372 * PI / 180.0;

fn rad(degrees: f64) -> f64 {
    degrees * PI / 180.0
}

/// Normalize degrees into `[0, 360)`.
pub fn wrap_degrees(degrees: f64) -> f64 {
    let wrapped = degrees.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

/// Days since J2000 noon, as a continuous fraction.
pub fn to_days(timestamp: i64) -> f64 {
    (timestamp - J2000_UNIX) as f64 / SECONDS_PER_DAY - 0.5
}

/// Equatorial coordinates, radians.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Equatorial {
    pub right_ascension: f64,
    pub declination: f64,
}

fn asin_clamped<T: AngularMath>(trig: &T, value: f64) -> f64 {
    trig.asin(value.clamp(-1.0, 1.0))
}

/// Right ascension from ecliptic longitude `l` and latitude `b`.
pub fn right_ascension<T: AngularMath>(trig: &T, l: f64, b: f64) -> f64 {
    trig.atan2(
        trig.sin(l) * trig.cos(OBLIQUITY) - trig.tan(b) * trig.sin(OBLIQUITY),
        trig.cos(l),
    )
}

/// Declination from ecliptic longitude `l` and latitude `b`.
pub fn declination<T: AngularMath>(trig: &T, l: f64, b: f64) -> f64 {
    asin_clamped(
        trig,
        trig.sin(b) * trig.cos(OBLIQUITY) + trig.cos(b) * trig.sin(OBLIQUITY) * trig.sin(l),
    )
}

/// Azimuth measured from south, radians, in `(-π, π]`.
pub fn azimuth<T: AngularMath>(trig: &T, hour_angle: f64, phi: f64, dec: f64) -> f64 {
    trig.atan2(
        trig.sin(hour_angle),
        trig.cos(hour_angle) * trig.sin(phi) - trig.tan(dec) * trig.cos(phi),
    )
}

pub fn altitude<T: AngularMath>(trig: &T, hour_angle: f64, phi: f64, dec: f64) -> f64 {
    asin_clamped(
        trig,
        trig.sin(phi) * trig.sin(dec) + trig.cos(phi) * trig.cos(dec) * trig.cos(hour_angle),
    )
}

/// Local sidereal time; `lw` is the west-positive longitude in radians.
pub fn sidereal_time(days: f64, lw: f64) -> f64 {
    rad(280.16 + 360.985_623_5 * days) - lw
}

pub fn solar_mean_anomaly(days: f64) -> f64 {
    rad(357.5291 + 0.985_600_28 * days)
}

pub fn ecliptic_longitude<T: AngularMath>(trig: &T, mean_anomaly: f64) -> f64 {
    let m = mean_anomaly;
    // equation of center
    let c = rad(1.9148 * trig.sin(m) + 0.02 * trig.sin(2.0 * m) + 0.0003 * trig.sin(3.0 * m));
    m + c + PERIHELION + PI
}

pub fn sun_coords<T: AngularMath>(trig: &T, days: f64) -> Equatorial {
    let l = ecliptic_longitude(trig, solar_mean_anomaly(days));
    Equatorial {
        right_ascension: right_ascension(trig, l, 0.0),
        declination: declination(trig, l, 0.0),
    }
}

/// Geocentric equatorial coordinates of the moon.
pub fn moon_coords<T: AngularMath>(trig: &T, days: f64) -> Equatorial {
    let ecl_lon = rad(218.316 + 13.176_396 * days);
    let mean_anomaly = rad(134.963 + 13.064_993 * days);
    let mean_distance = rad(93.272 + 13.229_350 * days);

    let l = ecl_lon + rad(6.289) * trig.sin(mean_anomaly);
    let b = rad(5.128) * trig.sin(mean_distance);

    Equatorial {
        right_ascension: right_ascension(trig, l, b),
        declination: declination(trig, l, b),
    }
}

/// Which body to evaluate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Body {
    Sun,
    Moon,
}

struct Horizon {
    hour_angle: f64,
    phi: f64,
    dec: f64,
}

fn horizon_frame<T: AngularMath>(
    trig: &T,
    body: Body,
    timestamp: i64,
    location: &ObserverLocation,
) -> Horizon {
    let lw = rad(-location.longitude);
    let phi = rad(location.latitude);
    let d = to_days(timestamp);

    let eq = match body {
        Body::Sun => sun_coords(trig, d),
        Body::Moon => moon_coords(trig, d),
    };

    Horizon {
        hour_angle: sidereal_time(d, lw) - eq.right_ascension,
        phi,
        dec: eq.declination,
    }
}

/// Altitude only, in degrees. Skips the azimuth branch for table building.
pub fn altitude_deg<T: AngularMath>(
    trig: &T,
    body: Body,
    timestamp: i64,
    location: &ObserverLocation,
) -> f64 {
    let h = horizon_frame(trig, body, timestamp, location);
    altitude(trig, h.hour_angle, h.phi, h.dec).to_degrees()
}

/// Full horizontal position in degrees.
///
/// Azimuth is shifted by 180° so that north is 0 and south is 180.
pub fn position<T: AngularMath>(
    trig: &T,
    body: Body,
    timestamp: i64,
    location: &ObserverLocation,
) -> CelestialPosition {
    let h = horizon_frame(trig, body, timestamp, location);
    let az = azimuth(trig, h.hour_angle, h.phi, h.dec);
    CelestialPosition {
        azimuth: wrap_degrees((az + PI).to_degrees()),
        altitude: altitude(trig, h.hour_angle, h.phi, h.dec).to_degrees(),
    }
}

pub fn sun_position<T: AngularMath>(
    trig: &T,
    timestamp: i64,
    location: &ObserverLocation,
) -> CelestialPosition {
    position(trig, Body::Sun, timestamp, location)
}

pub fn moon_position<T: AngularMath>(
    trig: &T,
    timestamp: i64,
    location: &ObserverLocation,
) -> CelestialPosition {
    position(trig, Body::Moon, timestamp, location)
}
