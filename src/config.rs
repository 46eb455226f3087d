//! Configuration management for calibration and device parameters
//!
//! This module provides runtime configuration loading from JSON files so
//! derivation rules, fallback thresholds and link timing can be adjusted
//! without recompilation. Missing sections and fields take their defaults.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::calibration::{DefaultThresholds, DerivationRules};

/// Complete application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub calibration: CalibrationConfig,
    pub device: DeviceConfig,
    pub telemetry: TelemetryConfig,
}

/// Calibration workflow parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationConfig {
    /// Length of one recording window in milliseconds
    pub window_ms: u64,
    /// Separation constants and trim fraction
    pub rules: DerivationRules,
    /// Fallback averages for unrecorded actions
    pub defaults: DefaultThresholds,
}

impl CalibrationConfig {
    pub fn window_duration(&self) -> Duration {
        Duration::from_millis(self.window_ms)
    }
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            window_ms: 3000,
            rules: DerivationRules::default(),
            defaults: DefaultThresholds::default(),
        }
    }
}

/// Serial link timing handed to the transport
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// Serial baud rate
    pub baud_rate: u32,
    /// Wait after opening the port while the board resets
    pub settle_ms: u64,
    /// Delay between consecutive parameter commands
    pub command_spacing_ms: u64,
    /// Delay before pushing all settings after connect
    pub initial_apply_delay_ms: u64,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            baud_rate: 115_200,
            settle_ms: 1800,
            command_spacing_ms: 20,
            initial_apply_delay_ms: 100,
        }
    }
}

/// Live telemetry bookkeeping
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Pressure points retained for plotting
    pub history_capacity: usize,
    /// Lower bound of the plotted pressure axis
    pub plot_min: i32,
    /// Upper bound of the plotted pressure axis
    pub plot_max: i32,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            history_capacity: 380,
            plot_min: -512,
            plot_max: 511,
        }
    }
}

impl AppConfig {
    /// Load configuration from JSON file
    ///
    /// # Arguments
    /// * `path` - Path to JSON config file
    ///
    /// # Returns
    /// The parsed configuration, or defaults if the file is missing or
    /// invalid (a warning is logged).
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Self {
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => {
                    log::info!("[Config] Loaded configuration from {:?}", path.as_ref());
                    config
                }
                Err(err) => {
                    log::warn!(
                        "[Config] Failed to parse JSON from {:?}: {}. Using defaults.",
                        path.as_ref(),
                        err
                    );
                    Self::default()
                }
            },
            Err(err) => {
                log::warn!(
                    "[Config] Failed to read config file {:?}: {}. Using defaults.",
                    path.as_ref(),
                    err
                );
                Self::default()
            }
        }
    }

    /// Load configuration from the default location
    pub fn load() -> Self {
        Self::load_from_file("assets/puff_config.json")
    }
}
