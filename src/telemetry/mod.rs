//! Live device telemetry.
//!
//! Routes decoded device lines into the latest-value snapshot, the bounded
//! pressure history and a broadcast stream for live subscribers. Calibration
//! samples are handed back to the caller so they can be fed into the
//! calibration session on the same execution context.

use tokio::sync::broadcast;

use crate::config::TelemetryConfig;
use crate::error::{log_protocol_error, ProtocolError};
use crate::protocol::{parse_line, DeviceMessage};

pub mod events;
pub mod history;

pub use events::TelemetryEvent;
pub use history::{plot_fraction, PressureHistory};

/// Latest values seen on the link
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TelemetrySnapshot {
    pub calibration_pressure: Option<i32>,
    pub runtime_pressure: Option<String>,
    pub joystick: (i32, i32),
    pub last_status: Option<String>,
    pub total_lines: u64,
    pub dropped_lines: u64,
}

/// Tracks live telemetry for one device connection
pub struct LiveTelemetry {
    tx: broadcast::Sender<TelemetryEvent>,
    history: PressureHistory,
    snapshot: TelemetrySnapshot,
    calibrating: bool,
    plot_min: i32,
    plot_max: i32,
}

impl LiveTelemetry {
    pub fn new(config: &TelemetryConfig) -> Self {
        let (tx, _) = broadcast::channel(256);
        Self {
            tx,
            history: PressureHistory::new(config.history_capacity),
            snapshot: TelemetrySnapshot::default(),
            calibrating: false,
            plot_min: config.plot_min,
            plot_max: config.plot_max,
        }
    }

    /// Subscribe to telemetry events
    pub fn subscribe(&self) -> broadcast::Receiver<TelemetryEvent> {
        self.tx.subscribe()
    }

    /// Switch calibration streaming on or off
    ///
    /// Turning it off clears the pressure history and the last calibration
    /// value, matching a fresh stream on the next start.
    pub fn set_calibrating(&mut self, calibrating: bool) {
        self.calibrating = calibrating;
        if !calibrating {
            self.history.clear();
            self.snapshot.calibration_pressure = None;
        }
    }

    pub fn is_calibrating(&self) -> bool {
        self.calibrating
    }

    /// Decode and route one raw line
    ///
    /// Malformed lines are counted and dropped. Returns the calibration
    /// sample carried by the line, if any.
    pub fn observe_line(&mut self, line: &str) -> Option<i32> {
        self.snapshot.total_lines += 1;
        match parse_line(line) {
            Ok(Some(message)) => self.observe(&message),
            Ok(None) => None,
            Err(err) => {
                self.drop_line(&err);
                None
            }
        }
    }

    /// Route one decoded message
    ///
    /// Calibration samples are only accepted while calibrating; the runtime
    /// pressure readout is ignored while calibrating.
    pub fn observe(&mut self, message: &DeviceMessage) -> Option<i32> {
        match message {
            DeviceMessage::CalibrationPressure { value } => {
                if !self.calibrating {
                    return None;
                }
                self.snapshot.calibration_pressure = Some(*value);
                self.history.push(*value);
                self.publish(TelemetryEvent::Pressure { value: *value });
                Some(*value)
            }
            DeviceMessage::Pressure { text } => {
                if !self.calibrating {
                    self.snapshot.runtime_pressure = Some(text.clone());
                    self.publish(TelemetryEvent::RuntimePressure { text: text.clone() });
                }
                None
            }
            DeviceMessage::Joystick { x, y } => {
                self.snapshot.joystick = (*x, *y);
                self.publish(TelemetryEvent::Joystick { x: *x, y: *y });
                None
            }
            DeviceMessage::Status { kind, line } => {
                tracing::info!("[Telemetry] Device: {}", line);
                self.snapshot.last_status = Some(line.clone());
                self.publish(TelemetryEvent::Status {
                    kind: *kind,
                    line: line.clone(),
                });
                None
            }
            DeviceMessage::Unknown { line } => {
                tracing::debug!("[Telemetry] Ignoring unrecognised line: {}", line);
                None
            }
        }
    }

    pub fn snapshot(&self) -> &TelemetrySnapshot {
        &self.snapshot
    }

    pub fn history(&self) -> &PressureHistory {
        &self.history
    }

    /// History mapped onto the configured plot axis, oldest first, in `[0, 1]`
    pub fn plot_points(&self) -> Vec<f32> {
        self.history.normalized(self.plot_min, self.plot_max)
    }

    /// Latest calibration reading on the configured plot axis
    pub fn latest_plot_fraction(&self) -> Option<f32> {
        self.snapshot
            .calibration_pressure
            .map(|value| plot_fraction(value, self.plot_min, self.plot_max))
    }

    /// Forget everything, e.g. after a disconnect
    pub fn reset(&mut self) {
        self.history.clear();
        self.snapshot = TelemetrySnapshot::default();
        self.calibrating = false;
    }

    fn drop_line(&mut self, err: &ProtocolError) {
        self.snapshot.dropped_lines += 1;
        log_protocol_error(err, "observe_line");
    }

    fn publish(&self, event: TelemetryEvent) {
        // no subscribers is fine
        let _ = self.tx.send(event);
    }
}
