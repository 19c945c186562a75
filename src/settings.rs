//! # Companion Settings Messages
//!
//! The companion device sends settings as a flat JSON object. Every key is
//! optional and independent:
//!
//! ```json
//! { "Latitude": 65, "Longitude": -147, "ShowInfo": 1, "Dayshift": 0 }
//! ```
//!
//! - `Latitude` / `Longitude`: integer degrees, west and south negative
//! - `ShowInfo`: 0/1 (booleans are accepted too)
//! - `Dayshift`: debug time shift in units of [`DAYSHIFT_SECS_PER_UNIT`]
//!
//! Values are not range-checked; they are passed through as supplied.

use crate::state::PersistedState;
use serde::Deserialize;
use thiserror::Error;

/// Seconds per `Dayshift` unit (one hour).
pub const DAYSHIFT_SECS_PER_UNIT: i64 = 3600;

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("malformed settings message: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// A 0/1 flag that may arrive as a number or a boolean.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Flag {
    Int(i32),
    Bool(bool),
}

impl Flag {
    pub fn is_set(self) -> bool {
        match self {
            Flag::Int(v) => v == 1,
            Flag::Bool(b) => b,
        }
    }
}

/// One settings message from the companion device.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct SettingsUpdate {
    #[serde(rename = "Latitude")]
    pub latitude: Option<i32>,
    #[serde(rename = "Longitude")]
    pub longitude: Option<i32>,
    #[serde(rename = "ShowInfo")]
    pub show_info: Option<Flag>,
    #[serde(rename = "Dayshift")]
    pub day_shift: Option<i32>,
}

impl SettingsUpdate {
    pub fn parse(message: &str) -> Result<Self, SettingsError> {
        Ok(serde_json::from_str(message)?)
    }

    /// True when the message touches anything the sky paths depend on.
    pub fn forces_recompute(&self) -> bool {
        self.latitude.is_some() || self.longitude.is_some() || self.day_shift.is_some()
    }

    /// Apply present fields to the persisted record.
    ///
    /// Returns whether the sky-path cache must be invalidated.
    pub fn apply(&self, state: &mut PersistedState) -> bool {
        if let Some(lat) = self.latitude {
            state.latitude = lat as f64;
        }
        if let Some(lon) = self.longitude {
            state.longitude = lon as f64;
        }
        if let Some(flag) = self.show_info {
            state.show_info = flag.is_set();
        }
        if let Some(shift) = self.day_shift {
            state.day_shift_secs = shift as i64 * DAYSHIFT_SECS_PER_UNIT;
        }
        self.forces_recompute()
    }
}
