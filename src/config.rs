//! # Configuration Management
//!
//! This module handles loading and parsing configuration from the skypath-config.toml file.
//! It covers display geometry, the cache invalidation policy and engine options. The
//! observer location is not here: it lives in the persisted state, because the
//! companion device changes it at runtime.

use crate::sky_path::CachePolicy;
use crate::trig::TrigMode;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub const CONFIG_FILE: &str = "skypath-config.toml";

/// Application configuration loaded from skypath-config.toml
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Screen and graph layout
    pub display: DisplayConfig,
    /// Sky-path cache invalidation thresholds
    pub cache: CacheConfig,
    /// Engine options
    pub engine: EngineConfig,
}

/// Display and visualization configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DisplayConfig {
    /// Screen width in pixels
    pub width: u32,
    /// Screen height in pixels
    pub height: u32,
    /// Fraction of the screen height given to the sky graph (top of screen)
    pub graph_fraction: f32,
    /// Use a 24-hour clock for the time text
    pub clock_24h: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CacheConfig {
    /// Maximum age of the hourly tables in seconds
    pub max_age_secs: i64,
    /// Location change (degrees) that forces a recompute
    pub location_tolerance_deg: f64,
    /// Local hour of the daily forced recompute
    pub daily_recompute_hour: u32,
    /// Local minute of the daily forced recompute
    pub daily_recompute_minute: u32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EngineConfig {
    /// "exact" for f64 trigonometry, "lookup" for the fixed-point tables
    pub trig: TrigMode,
    /// Ignore repeated taps within this window
    pub tap_cooldown_ms: u64,
    /// Where the persisted state record is stored
    pub state_path: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            display: DisplayConfig {
                width: 144,  // Pebble-class watch screen
                height: 168, // Pebble-class watch screen
                graph_fraction: 0.4,
                clock_24h: true,
            },
            cache: CacheConfig {
                max_age_secs: 3600,
                location_tolerance_deg: 0.5,
                daily_recompute_hour: 0,
                daily_recompute_minute: 1,
            },
            engine: EngineConfig {
                trig: TrigMode::Exact,
                tap_cooldown_ms: 500,
                state_path: "skypath-state.json".to_string(),
            },
        }
    }
}

impl Config {
    /// Load configuration from skypath-config.toml file
    /// Falls back to default configuration if file doesn't exist or is invalid
    pub fn load() -> Self {
        Self::load_from_path(CONFIG_FILE)
    }

    /// Load configuration from specified path
    /// Falls back to default configuration if file doesn't exist or is invalid
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Self {
        match fs::read_to_string(&path) {
            Ok(contents) => match toml::from_str::<Config>(&contents) {
                Ok(config) => {
                    info!("Loaded configuration from {}", path.as_ref().display());
                    config
                }
                Err(e) => {
                    warn!("Invalid config file format: {}", e);
                    warn!("Using default configuration");
                    Self::default()
                }
            },
            Err(_) => {
                info!("No config file found, using default configuration");
                Self::default()
            }
        }
    }

    /// Save current configuration to skypath-config.toml
    pub fn save(&self) -> anyhow::Result<()> {
        self.save_to_path(CONFIG_FILE)
    }

    pub fn save_to_path<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let contents = toml::to_string_pretty(self)?;
        fs::write(&path, contents)?;
        info!("Configuration saved to {}", path.as_ref().display());
        Ok(())
    }

    pub fn cache_policy(&self) -> CachePolicy {
        CachePolicy {
            max_age_secs: self.cache.max_age_secs,
            location_tolerance_deg: self.cache.location_tolerance_deg,
        }
    }

    /// Pixel size of the sky graph area.
    pub fn graph_size(&self) -> (u32, u32) {
        let height = (self.display.height as f32 * self.display.graph_fraction) as u32;
        (self.display.width, height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.cache.max_age_secs, 3600);
        assert_eq!(config.cache.location_tolerance_deg, 0.5);
        assert_eq!(config.engine.tap_cooldown_ms, 500);
        assert_eq!(config.engine.trig, TrigMode::Exact);
        assert_eq!(config.graph_size(), (144, 67));
    }

    #[test]
    fn test_config_roundtrip() {
        let config = Config::default();
        let toml_str = toml::to_string(&config).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(config.engine.state_path, parsed.engine.state_path);
        assert_eq!(config.display.width, parsed.display.width);
    }

    #[test]
    fn test_load_nonexistent_file() {
        let config = Config::load_from_path("/nonexistent/path");
        // Should fallback to default
        assert_eq!(config.display.width, 144);
    }

    #[test]
    fn test_load_custom_file() {
        let file = NamedTempFile::new().unwrap();
        let custom = r#"
[display]
width = 200
height = 228
graph_fraction = 0.5
clock_24h = false

[cache]
max_age_secs = 1800
location_tolerance_deg = 0.25
daily_recompute_hour = 0
daily_recompute_minute = 1

[engine]
trig = "lookup"
tap_cooldown_ms = 300
state_path = "/tmp/skypath-test.json"
"#;
        fs::write(file.path(), custom).unwrap();
        let config = Config::load_from_path(file.path());
        assert_eq!(config.display.width, 200);
        assert_eq!(config.engine.trig, TrigMode::Lookup);
        assert_eq!(config.cache_policy().max_age_secs, 1800);
        assert_eq!(config.graph_size(), (200, 114));
    }

    #[test]
    fn test_invalid_file_falls_back() {
        let file = NamedTempFile::new().unwrap();
        fs::write(file.path(), "display = 3").unwrap();
        let config = Config::load_from_path(file.path());
        assert_eq!(config.display.width, 144);
    }

    #[test]
    fn test_save_and_reload() {
        let file = NamedTempFile::new().unwrap();
        let mut config = Config::default();
        config.engine.tap_cooldown_ms = 750;
        config.save_to_path(file.path()).unwrap();
        let loaded = Config::load_from_path(file.path());
        assert_eq!(loaded.engine.tap_cooldown_ms, 750);
    }
}
