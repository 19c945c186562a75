//! # Position Interpolation
//!
//! Maps cached hourly samples and the fractional time of day into graph
//! coordinates. The x axis is the 24-hour local day; the y axis is altitude,
//! scaled to the observer's latitude so the interesting band near the horizon
//! fills the graph.

use crate::HourlyTable;

/// Lowest altitude at which a live marker is drawn, degrees.
pub const MARKER_FLOOR_DEG: f64 = -7.0;

/// Pixel size of the graph area.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GraphGeometry {
    pub width: f64,
    pub height: f64,
}

impl GraphGeometry {
    pub fn new(width: f64, height: f64) -> Self {
        GraphGeometry { width, height }
    }

    /// `hour` runs continuously from 0 to 24.
    pub fn hour_to_x(&self, hour: f64) -> f64 {
        hour / 24.0 * self.width
    }

    /// Vertical pixel for an altitude; smaller y is higher on screen.
    ///
    /// The full graph spans 135% of the altitude range the sun can reach at
    /// this latitude (capped at 110°), with the top at 105% (capped at 90°),
    /// leaving a 30% band below the horizon.
    pub fn angle_to_y(&self, altitude: f64, latitude: f64) -> f64 {
        let reach = 90.0 - latitude.abs().min(90.0) + 23.5;
        let range = (reach * 1.35).min(110.0);
        let top = (reach * 1.05).min(90.0);
        (top - altitude) / range * self.height
    }

    pub fn to_screen(&self, hour: f64, altitude: f64, latitude: f64) -> (f64, f64) {
        (self.hour_to_x(hour), self.angle_to_y(altitude, latitude))
    }
}

pub fn interp_elevation(current: f64, next: f64, frac: f64) -> f64 {
    current + (next - current) * frac
}

/// Interpolate azimuth across the 0/360 seam.
///
/// A negative slope is taken as a wrap, so the result always moves clockwise.
pub fn interp_azimuth(current: f64, next: f64, frac: f64) -> f64 {
    let mut slope = next - current;
    if slope < 0.0 {
        slope += 360.0;
    }
    crate::ephemeris::wrap_degrees(current + slope * frac)
}

/// Display hour of a sample, wrapped into `[0, 24)`.
pub fn interp_hour(hour: usize, frac: f64, offset: f64) -> f64 {
    let h = (hour as f64 + frac + offset).rem_euclid(24.0);
    if h >= 24.0 {
        0.0
    } else {
        h
    }
}

/// A segment is drawn only if one of its ends is above the horizon.
pub fn segment_visible(start_alt: f64, end_alt: f64) -> bool {
    start_alt > 0.0 || end_alt > 0.0
}

pub fn clamp_marker_elevation(altitude: f64) -> f64 {
    altitude.max(MARKER_FLOOR_DEG)
}

/// One drawable piece of a body's path, in hours and degrees.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PathSegment {
    pub start_hour: f64,
    pub start_alt: f64,
    pub end_hour: f64,
    pub end_alt: f64,
}

/// Visible segments of a body's daily path.
///
/// `offset` is 0 for the sun and the lunar fine shift for the moon. Shifted
/// segments that would wrap past hour 24 are dropped rather than drawn across
/// the whole graph.
pub fn path_segments(table: &HourlyTable, offset: f64) -> Vec<PathSegment> {
    let mut segments = Vec::with_capacity(24);
    for hour in 0..24 {
        let (start_alt, end_alt) = table.interval(hour);
        if !segment_visible(start_alt, end_alt) {
            continue;
        }

        let start_hour = if offset == 0.0 {
            hour as f64
        } else {
            interp_hour(hour, 0.0, offset)
        };
        let end_hour = start_hour + 1.0;
        if end_hour > 24.0 {
            continue;
        }

        segments.push(PathSegment {
            start_hour,
            start_alt,
            end_hour,
            end_alt,
        });
    }
    segments
}

/// Position of a body's icon on the graph.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Marker {
    pub hour: f64,
    /// Interpolated altitude, degrees.
    pub altitude: f64,
    /// Altitude used for drawing, clamped at [`MARKER_FLOOR_DEG`].
    pub draw_altitude: f64,
}

/// Live marker for local `hour` (0..=23) plus `frac` of the next hour.
pub fn live_marker(table: &HourlyTable, hour: usize, frac: f64, offset: f64) -> Marker {
    let (current, next) = table.interval(hour);
    let altitude = interp_elevation(current, next, frac);
    Marker {
        hour: interp_hour(hour, frac, offset),
        altitude,
        draw_altitude: clamp_marker_elevation(altitude),
    }
}
