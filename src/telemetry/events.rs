//! Telemetry event payloads published to live subscribers.

use serde::{Deserialize, Serialize};

use crate::protocol::StatusKind;

/// One observation from the device link
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum TelemetryEvent {
    /// Raw calibration pressure sample
    Pressure { value: i32 },
    /// Runtime pressure readout shown outside calibration
    RuntimePressure { text: String },
    /// Centred joystick position
    Joystick { x: i32, y: i32 },
    /// Firmware status line
    Status { kind: StatusKind, line: String },
}
