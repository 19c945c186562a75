//! # Sky Engine
//!
//! The single context object that owns all mutable state: the persisted record
//! (location, flags), the sky-path cache and the display state. Every trigger
//! goes through it:
//!
//! - [`SkyEngine::on_tick`]: minute clock tick, returns the frame to draw
//! - [`SkyEngine::apply_settings`]: companion settings message
//! - [`SkyEngine::on_tap`]: shake/tap gesture, advances the info line
//!
//! The engine is owned by one task, so a recompute always finishes before any
//! frame reads the tables.

use crate::config::Config;
use crate::display::{DisplayState, InfoLine, Reading, SunImage};
use crate::ephemeris::{moon_position, sun_position};
use crate::interpolate::{live_marker, path_segments, GraphGeometry, Marker, PathSegment};
use crate::lunar::{lunar_day, MoonImage};
use crate::settings::SettingsUpdate;
use crate::sky_path::SkyPathCache;
use crate::state::{PersistedState, StateError};
use crate::trig::{AngularMath, Trig};
use crate::ObserverLocation;
use chrono::{DateTime, TimeDelta, TimeZone, Timelike};
use log::{debug, info, warn};
use std::fmt::Display;
use std::time::Duration as StdDuration;

/// Everything the renderer needs for one redraw.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    pub geometry: GraphGeometry,
    /// Observer latitude, for the altitude scale
    pub latitude: f64,
    pub sun_path: Vec<PathSegment>,
    pub moon_path: Vec<PathSegment>,
    pub sun_marker: Marker,
    pub moon_marker: Marker,
    pub sun_image: SunImage,
    pub moon_image: MoonImage,
    pub time_text: String,
    pub date_text: String,
    pub info: InfoLine,
}

impl Frame {
    pub fn to_screen(&self, hour: f64, altitude: f64) -> (f64, f64) {
        self.geometry.to_screen(hour, altitude, self.latitude)
    }
}

pub struct SkyEngine<T: AngularMath = Trig> {
    config: Config,
    state: PersistedState,
    cache: SkyPathCache<T>,
    display: DisplayState,
}

impl SkyEngine<Trig> {
    /// Engine on the trigonometry provider selected in the config.
    pub fn from_config(config: Config, state: PersistedState) -> Self {
        let trig = Trig::from(config.engine.trig);
        SkyEngine::new(config, state, trig)
    }
}

impl<T: AngularMath> SkyEngine<T> {
    pub fn new(config: Config, state: PersistedState, trig: T) -> Self {
        let cache = SkyPathCache::new(trig, config.cache_policy());
        let mut display = DisplayState::new(StdDuration::from_millis(config.engine.tap_cooldown_ms));
        display.restore(&state);
        SkyEngine {
            config,
            state,
            cache,
            display,
        }
    }

    pub fn location(&self) -> ObserverLocation {
        self.state.location()
    }

    pub fn cache(&self) -> &SkyPathCache<T> {
        &self.cache
    }

    pub fn display(&self) -> &DisplayState {
        &self.display
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn geometry(&self) -> GraphGeometry {
        let (w, h) = self.config.graph_size();
        GraphGeometry::new(w as f64, h as f64)
    }

    /// Wall-clock time plus the debug day shift.
    ///
    /// A shift that leaves chrono's representable range is ignored.
    pub fn shifted<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> DateTime<Tz> {
        TimeDelta::try_seconds(self.state.day_shift_secs)
            .and_then(|shift| now.clone().checked_add_signed(shift))
            .unwrap_or_else(|| {
                warn!(
                    "Day shift of {}s is out of range, using wall time",
                    self.state.day_shift_secs
                );
                now.clone()
            })
    }

    /// Recompute the tables if the cache is stale. Returns whether it ran.
    pub fn refresh<Tz: TimeZone>(&mut self, now: &DateTime<Tz>) -> bool {
        let shifted = self.shifted(now);
        let location = self.location();
        self.cache.recompute(&shifted, &location)
    }

    /// Minute tick: force the daily recompute when due, then build a frame.
    ///
    /// The daily trigger follows the shifted clock, the same one the tables
    /// are anchored to.
    pub fn on_tick<Tz: TimeZone>(&mut self, now: &DateTime<Tz>) -> Frame
    where
        Tz::Offset: Display,
    {
        let shifted = self.shifted(now);
        if shifted.hour() == self.config.cache.daily_recompute_hour
            && shifted.minute() == self.config.cache.daily_recompute_minute
        {
            debug!("Daily ephemeris refresh");
            self.cache.invalidate();
        }
        self.frame(now)
    }

    /// Apply a companion settings message.
    ///
    /// Location or day-shift changes invalidate the cache and recompute
    /// immediately. Returns whether a recompute ran.
    pub fn apply_settings<Tz: TimeZone>(
        &mut self,
        update: &SettingsUpdate,
        now: &DateTime<Tz>,
    ) -> bool {
        if update.apply(&mut self.state) {
            info!(
                "Settings changed: lat {} lon {} shift {}s",
                self.state.latitude, self.state.longitude, self.state.day_shift_secs
            );
            self.cache.invalidate();
        }
        self.display.show_info = self.state.show_info;
        self.refresh(now)
    }

    pub fn on_tap(&mut self) -> bool {
        self.display.on_tap()
    }

    /// Build the frame for `now`, refreshing the cache first if needed.
    pub fn frame<Tz: TimeZone>(&mut self, now: &DateTime<Tz>) -> Frame
    where
        Tz::Offset: Display,
    {
        self.refresh(now);

        let shifted = self.shifted(now);
        let t = shifted.timestamp();
        let location = self.location();
        let hour = shifted.hour() as usize;
        let frac = shifted.minute() as f64 / 60.0;
        let fine_shift = self.cache.alignment().fine_shift;

        let sun_marker = live_marker(self.cache.solar(), hour, frac, 0.0);
        let moon_marker = live_marker(self.cache.lunar(), hour, frac, fine_shift);

        self.display.sun = Reading::from(sun_position(self.cache.trig(), t, &location));
        self.display.moon = Reading::from(moon_position(self.cache.trig(), t, &location));

        let time_format = if self.config.display.clock_24h {
            "%k:%M"
        } else {
            "%l:%M"
        };
        let time_text = shifted.format(time_format).to_string().trim_start().to_string();
        let date_text = shifted.format("%a, %b %e").to_string();

        let frame = Frame {
            geometry: self.geometry(),
            latitude: location.latitude,
            sun_path: path_segments(self.cache.solar(), 0.0),
            moon_path: path_segments(self.cache.lunar(), fine_shift),
            sun_marker,
            moon_marker,
            sun_image: self.display.sun_image(),
            moon_image: MoonImage::at(t),
            time_text,
            date_text,
            info: self.display.info_line(lunar_day(t)),
        };
        debug!(
            "Updated screen: sun [{}:{}] moon [{}:{}]",
            self.display.sun.altitude,
            self.display.sun.azimuth,
            self.display.moon.altitude,
            self.display.moon.azimuth
        );
        frame
    }

    /// Snapshot of the record as it would be written to disk.
    pub fn persisted(&self) -> PersistedState {
        let mut state = self.state.clone();
        self.display.store(&mut state);
        state
    }

    /// Write the persisted record to the configured path.
    pub fn save_state(&self) -> Result<(), StateError> {
        let state = self.persisted();
        state.save(&self.config.engine.state_path)?;
        debug!("Stored state to {}", self.config.engine.state_path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lunar::REFERENCE_NEW_MOON;
    use crate::trig::ExactTrig;
    use chrono::{FixedOffset, Utc};

    fn engine() -> SkyEngine<ExactTrig> {
        SkyEngine::new(Config::default(), PersistedState::default(), ExactTrig)
    }

    fn utc(timestamp: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(timestamp, 0).single().unwrap()
    }

    #[test]
    fn test_first_frame_forces_compute() {
        let mut engine = engine();
        engine.frame(&utc(1_600_000_000));
        assert_eq!(engine.cache().computations(), 1);
        engine.frame(&utc(1_600_000_060));
        assert!(engine.cache().computations() <= 2);
    }

    #[test]
    fn test_new_moon_frame_selects_new_moon_image() {
        let mut engine = engine();
        let frame = engine.frame(&utc(REFERENCE_NEW_MOON));
        assert_eq!(frame.moon_image, MoonImage::New);
        assert_eq!(frame.info, InfoLine::Sun(engine.display().sun));
        assert_eq!(engine.location().latitude, 64.8);
    }

    #[test]
    fn test_settings_location_forces_recompute() {
        let mut engine = engine();
        let now = utc(1_600_000_000);
        engine.refresh(&now);

        let update = SettingsUpdate {
            latitude: Some(65),
            ..SettingsUpdate::default()
        };
        // 0.2° move is within tolerance but the message still forces it
        assert!(engine.apply_settings(&update, &now));
        assert_eq!(engine.cache().computations(), 2);
        assert_eq!(engine.cache().validity().unwrap().last_latitude, 65.0);
    }

    #[test]
    fn test_settings_show_info_does_not_recompute() {
        let mut engine = engine();
        let now = utc(1_600_000_000);
        engine.refresh(&now);

        let update = SettingsUpdate::parse(r#"{"ShowInfo": 0}"#).unwrap();
        assert!(!engine.apply_settings(&update, &now));
        assert_eq!(engine.cache().computations(), 1);
        let frame = engine.frame(&now);
        assert_eq!(frame.info, InfoLine::Hidden);
        assert!(!engine.persisted().show_info);
    }

    #[test]
    fn test_day_shift_moves_frame_time() {
        let mut engine = engine();
        let now = Utc.with_ymd_and_hms(2021, 6, 1, 8, 30, 0).single().unwrap();
        let update = SettingsUpdate::parse(r#"{"Dayshift": 3}"#).unwrap();
        assert!(engine.apply_settings(&update, &now));
        let frame = engine.frame(&now);
        assert_eq!(frame.time_text, "11:30");
        assert!((frame.sun_marker.hour - 11.5).abs() < 1e-9);
    }

    #[test]
    fn test_daily_tick_forces_recompute() {
        let mut engine = engine();
        let tz = FixedOffset::east_opt(0).unwrap();
        let before = tz.with_ymd_and_hms(2021, 6, 2, 0, 0, 0).single().unwrap();
        engine.on_tick(&before);
        let count = engine.cache().computations();

        let at_0001 = tz.with_ymd_and_hms(2021, 6, 2, 0, 1, 0).single().unwrap();
        engine.on_tick(&at_0001);
        assert_eq!(engine.cache().computations(), count + 1);
    }

    #[test]
    fn test_daily_tick_follows_shifted_clock() {
        let state = PersistedState {
            day_shift_secs: 3 * 3600,
            ..PersistedState::default()
        };
        let mut engine = SkyEngine::new(Config::default(), state, ExactTrig);
        let tz = FixedOffset::east_opt(0).unwrap();

        // wall 21:00 is shifted 00:00
        engine.on_tick(&tz.with_ymd_and_hms(2021, 6, 1, 21, 0, 0).single().unwrap());
        let count = engine.cache().computations();

        // wall 21:01 is shifted 00:01 of the new shifted day
        let frame = engine.on_tick(&tz.with_ymd_and_hms(2021, 6, 1, 21, 1, 0).single().unwrap());
        assert_eq!(engine.cache().computations(), count + 1);
        assert_eq!(frame.time_text, "0:01");
        assert_eq!(frame.date_text, "Wed, Jun  2");

        // wall 00:01 is shifted 03:01: no forced refresh
        let mut engine = SkyEngine::new(Config::default(), engine.persisted(), ExactTrig);
        engine.on_tick(&tz.with_ymd_and_hms(2021, 6, 2, 0, 0, 0).single().unwrap());
        let before = engine.cache().computations();
        engine.on_tick(&tz.with_ymd_and_hms(2021, 6, 2, 0, 1, 0).single().unwrap());
        assert_eq!(engine.cache().computations(), before);
    }

    #[test]
    fn test_out_of_range_day_shift_uses_wall_time() {
        let state = PersistedState {
            day_shift_secs: i64::MAX / 2,
            ..PersistedState::default()
        };
        let mut engine = SkyEngine::new(Config::default(), state, ExactTrig);
        let now = Utc.with_ymd_and_hms(2021, 6, 1, 8, 30, 0).single().unwrap();

        assert_eq!(engine.shifted(&now), now);
        let frame = engine.on_tick(&now);
        assert_eq!(frame.time_text, "8:30");
        assert!((frame.sun_marker.hour - 8.5).abs() < 1e-9);
    }

    #[test]
    fn test_frame_markers_follow_clock() {
        let mut engine = engine();
        let now = Utc.with_ymd_and_hms(2021, 6, 1, 14, 45, 0).single().unwrap();
        let frame = engine.frame(&now);
        assert!((frame.sun_marker.hour - 14.75).abs() < 1e-9);
        assert!(frame.sun_marker.draw_altitude >= -7.0);
        assert!(frame.moon_marker.draw_altitude >= -7.0);
        assert!((0.0..24.0).contains(&frame.moon_marker.hour));
        assert_eq!(frame.date_text, "Tue, Jun  1");
    }

    #[test]
    fn test_readings_match_direct_position() {
        let mut engine = engine();
        let now = utc(1_650_000_000);
        engine.frame(&now);
        let expected = Reading::from(sun_position(&ExactTrig, now.timestamp(), &engine.location()));
        assert_eq!(engine.display().sun, expected);
        assert_eq!(engine.persisted().sun_altitude, expected.altitude);
    }

    #[test]
    fn test_save_state_writes_record() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let mut config = Config::default();
        config.engine.state_path = file.path().to_string_lossy().into_owned();
        let mut engine = SkyEngine::new(config, PersistedState::default(), ExactTrig);
        engine.frame(&utc(1_600_000_000));
        engine.save_state().unwrap();

        let loaded = PersistedState::load(file.path()).unwrap();
        assert_eq!(loaded, engine.persisted());
    }
}
