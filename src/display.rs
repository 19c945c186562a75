//! # Display State
//!
//! What the UI remembers between redraws:
//! - the last rounded sun/moon readings (also persisted)
//! - which reading the info line is showing
//! - a tap debounce, so that one physical shake advances the info line once
//!
//! The debounce is a single-shot tokio timer guarded by an atomic flag. The
//! first tap arms the flag and spawns the timer. Taps while armed are ignored.
//! When the timer fires the flag is cleared. Re-arming or cancelling aborts any
//! outstanding timer. Without a runtime the debounce is a pass-through.

use crate::state::PersistedState;
use crate::{round_half_away, CelestialPosition};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

/// Number of info line modes.
pub const INFO_MODES: u8 = 3;

/// Sun icon: fully risen or sitting on the horizon rim.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SunImage {
    Risen,
    Rim,
}

impl SunImage {
    /// Risen when the rounded altitude is above zero.
    pub fn for_altitude(rounded_altitude: i32) -> Self {
        if rounded_altitude > 0 {
            SunImage::Risen
        } else {
            SunImage::Rim
        }
    }
}

/// A rounded altitude/azimuth pair, as shown on the info line.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Reading {
    pub altitude: i32,
    pub azimuth: i32,
}

impl From<CelestialPosition> for Reading {
    fn from(pos: CelestialPosition) -> Self {
        Reading {
            altitude: round_half_away(pos.altitude),
            azimuth: round_half_away(pos.azimuth),
        }
    }
}

/// Content of the info line.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum InfoLine {
    Hidden,
    Sun(Reading),
    Moon(Reading),
    MoonAge(u32),
}

impl InfoLine {
    pub fn text(&self) -> String {
        match self {
            InfoLine::Hidden => " ".to_string(),
            InfoLine::Sun(r) => format!("Sun [{}:{}]", r.altitude, r.azimuth),
            InfoLine::Moon(r) => format!("Moon [{}:{}]", r.altitude, r.azimuth),
            InfoLine::MoonAge(days) => format!("Moon {}d old", days),
        }
    }
}

/// Cancellable single-shot cooldown.
#[derive(Debug)]
pub struct TapDebounce {
    armed: Arc<AtomicBool>,
    timer: Option<JoinHandle<()>>,
    cooldown: Duration,
}

impl TapDebounce {
    pub fn new(cooldown: Duration) -> Self {
        TapDebounce {
            armed: Arc::new(AtomicBool::new(false)),
            timer: None,
            cooldown,
        }
    }

    /// Accept a tap unless one was accepted within the cooldown.
    ///
    /// Outside a tokio runtime there is no timer to clear the flag, so every
    /// tap is accepted and nothing is armed.
    pub fn accept(&mut self) -> bool {
        let Ok(runtime) = Handle::try_current() else {
            return true;
        };
        if self.armed.swap(true, Ordering::AcqRel) {
            return false;
        }
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
        let armed = Arc::clone(&self.armed);
        let cooldown = self.cooldown;
        self.timer = Some(runtime.spawn(async move {
            tokio::time::sleep(cooldown).await;
            armed.store(false, Ordering::Release);
        }));
        true
    }

    pub fn is_armed(&self) -> bool {
        self.armed.load(Ordering::Acquire)
    }

    /// Drop any pending cooldown and accept the next tap immediately.
    pub fn cancel(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
        self.armed.store(false, Ordering::Release);
    }
}

impl Drop for TapDebounce {
    fn drop(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }
}

/// UI-side state, written once per redraw.
#[derive(Debug)]
pub struct DisplayState {
    pub sun: Reading,
    pub moon: Reading,
    pub info_index: u8,
    pub show_info: bool,
    pub debounce: TapDebounce,
}

impl DisplayState {
    pub fn new(cooldown: Duration) -> Self {
        DisplayState {
            sun: Reading::default(),
            moon: Reading::default(),
            info_index: 0,
            show_info: true,
            debounce: TapDebounce::new(cooldown),
        }
    }

    /// Restore readings and flags from the persisted record.
    pub fn restore(&mut self, state: &PersistedState) {
        self.sun = Reading {
            altitude: state.sun_altitude,
            azimuth: state.sun_azimuth,
        };
        self.moon = Reading {
            altitude: state.moon_altitude,
            azimuth: state.moon_azimuth,
        };
        self.info_index = state.info_index % INFO_MODES;
        self.show_info = state.show_info;
    }

    /// Copy readings and flags into the persisted record.
    pub fn store(&self, state: &mut PersistedState) {
        state.sun_altitude = self.sun.altitude;
        state.sun_azimuth = self.sun.azimuth;
        state.moon_altitude = self.moon.altitude;
        state.moon_azimuth = self.moon.azimuth;
        state.info_index = self.info_index;
        state.show_info = self.show_info;
    }

    /// Advance the info line if the tap gets past the debounce.
    pub fn on_tap(&mut self) -> bool {
        if !self.debounce.accept() {
            return false;
        }
        self.info_index = (self.info_index + 1) % INFO_MODES;
        true
    }

    pub fn info_line(&self, lunar_day: u32) -> InfoLine {
        if !self.show_info {
            return InfoLine::Hidden;
        }
        match self.info_index % INFO_MODES {
            0 => InfoLine::Sun(self.sun),
            1 => InfoLine::Moon(self.moon),
            _ => InfoLine::MoonAge(lunar_day),
        }
    }

    pub fn sun_image(&self) -> SunImage {
        SunImage::for_altitude(self.sun.altitude)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sun_image_threshold() {
        assert_eq!(SunImage::for_altitude(1), SunImage::Risen);
        assert_eq!(SunImage::for_altitude(0), SunImage::Rim);
        assert_eq!(SunImage::for_altitude(-12), SunImage::Rim);
    }

    #[test]
    fn test_reading_rounds_half_away() {
        let r = Reading::from(CelestialPosition {
            azimuth: 180.5,
            altitude: -2.5,
        });
        assert_eq!(r, Reading { altitude: -3, azimuth: 181 });
    }

    #[test]
    fn test_info_line_text() {
        let r = Reading { altitude: 12, azimuth: 200 };
        assert_eq!(InfoLine::Sun(r).text(), "Sun [12:200]");
        assert_eq!(InfoLine::Moon(r).text(), "Moon [12:200]");
        assert_eq!(InfoLine::MoonAge(7).text(), "Moon 7d old");
        assert_eq!(InfoLine::Hidden.text(), " ");
    }

    #[test]
    fn test_restore_and_store() {
        let state = PersistedState {
            info_index: 5,
            sun_altitude: 14,
            moon_azimuth: 99,
            show_info: false,
            ..PersistedState::default()
        };
        let mut display = DisplayState::new(Duration::from_millis(500));
        display.restore(&state);
        assert_eq!(display.info_index, 2);
        assert_eq!(display.sun.altitude, 14);
        assert_eq!(display.info_line(3), InfoLine::Hidden);

        let mut out = PersistedState::default();
        display.store(&mut out);
        assert_eq!(out.moon_azimuth, 99);
        assert_eq!(out.info_index, 2);
        assert!(!out.show_info);
    }

    #[tokio::test(start_paused = true)]
    async fn test_tap_debounce_ignores_repeats() {
        let mut display = DisplayState::new(Duration::from_millis(500));
        assert!(display.on_tap());
        assert_eq!(display.info_index, 1);

        // same gesture
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(!display.on_tap());
        assert_eq!(display.info_index, 1);

        // cooldown elapsed
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert!(!display.debounce.is_armed());
        assert!(display.on_tap());
        assert_eq!(display.info_index, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_tap_rotation_wraps() {
        let mut display = DisplayState::new(Duration::from_millis(500));
        for expected in [1, 2, 0, 1] {
            assert!(display.on_tap());
            assert_eq!(display.info_index, expected);
            tokio::time::sleep(Duration::from_millis(501)).await;
        }
    }

    #[test]
    fn test_tap_without_runtime_is_not_debounced() {
        let mut display = DisplayState::new(Duration::from_millis(500));
        assert!(display.on_tap());
        assert!(display.on_tap());
        assert_eq!(display.info_index, 2);
        assert!(!display.debounce.is_armed());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_rearms_immediately() {
        let mut debounce = TapDebounce::new(Duration::from_millis(500));
        assert!(debounce.accept());
        assert!(debounce.is_armed());
        debounce.cancel();
        assert!(!debounce.is_armed());
        assert!(debounce.accept());
    }
}
