//! # Persisted State
//!
//! A single fixed record holding everything that must survive a restart: the
//! observer location and flags set by the companion device, plus the last
//! rounded readings shown on the info line.
//!
//! ## Storage
//! - **Format**: JSON via `serde_json`, one object per file
//! - **When**: read once at startup, written on every settings update and at
//!   shutdown
//! - **Fallback**: a missing or corrupt file yields [`PersistedState::default`]
//!   (Fairbanks, info shown, rotation 0), so the engine always has a location

use crate::ObserverLocation;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::{fs, io, path::Path};
use thiserror::Error;

/// Errors that can occur while reading or writing the state record.
#[derive(Error, Debug)]
pub enum StateError {
    /// File operations failed (permissions, disk space)
    #[error("state IO: {0}")]
    Io(#[from] io::Error),

    /// Record could not be encoded or decoded
    #[error("state format: {0}")]
    Format(#[from] serde_json::Error),
}

/// The persisted settings and readings record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistedState {
    pub latitude: f64,
    pub longitude: f64,
    pub show_info: bool,
    /// Debug-only time shift, seconds
    pub day_shift_secs: i64,
    /// Which reading the info line shows
    pub info_index: u8,
    pub sun_altitude: i32,
    pub sun_azimuth: i32,
    pub moon_altitude: i32,
    pub moon_azimuth: i32,
}

impl Default for PersistedState {
    fn default() -> Self {
        let location = ObserverLocation::default();
        PersistedState {
            latitude: location.latitude,
            longitude: location.longitude,
            show_info: true,
            day_shift_secs: 0,
            info_index: 0,
            sun_altitude: 0,
            sun_azimuth: 0,
            moon_altitude: 0,
            moon_azimuth: 0,
        }
    }
}

impl PersistedState {
    pub fn location(&self) -> ObserverLocation {
        ObserverLocation {
            latitude: self.latitude,
            longitude: self.longitude,
        }
    }

    /// Read the record, or fall back to defaults if it is missing or corrupt.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        match Self::load(&path) {
            Ok(state) => {
                debug!("Loaded state from {}", path.as_ref().display());
                state
            }
            Err(StateError::Io(e)) if e.kind() == io::ErrorKind::NotFound => {
                debug!("No state file, using defaults");
                Self::default()
            }
            Err(e) => {
                warn!("Ignoring unreadable state file: {}", e);
                Self::default()
            }
        }
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, StateError> {
        let data = fs::read(path)?;
        let state = serde_json::from_slice(&data)?;
        Ok(state)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), StateError> {
        let data = serde_json::to_vec(self)?;
        fs::write(path, data)?;
        Ok(())
    }
}
