// Puff Tuner Core - sip/puff controller calibration and device protocol
// Turns recorded pressure windows into ordered thresholds and device commands

pub mod calibration;
pub mod config;
pub mod error;
pub mod fixtures;
pub mod managers;
pub mod profile;
pub mod protocol;
pub mod settings;
pub mod telemetry;

pub use calibration::{
    Action, ActionStats, CalibrationSession, RecordingCompleted, ThresholdSet,
    ThresholdSuggestion, WindowId,
};
pub use config::AppConfig;
pub use managers::{CalibrationManager, RecordingEvent};
pub use profile::Profile;
pub use protocol::{DeviceCommand, DeviceMessage};
pub use settings::{DeviceMode, DeviceSettings, KeyboardBindings};
pub use telemetry::LiveTelemetry;
