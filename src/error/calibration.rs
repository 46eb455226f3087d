// Calibration error types and constants

use crate::error::ErrorCode;
use log::error;
use std::fmt;

/// Calibration error code constants
///
/// Error code range: 2001-2003
pub struct CalibrationErrorCodes {}

impl CalibrationErrorCodes {
    /// No sensor stream is running, so there is no session to record into
    pub const STREAM_NOT_RUNNING: i32 = 2001;

    /// A sensor stream is already running
    pub const STREAM_ALREADY_RUNNING: i32 = 2002;

    /// Calibration session lock was poisoned
    pub const STATE_POISONED: i32 = 2003;
}

/// Log a calibration error with structured context
///
/// Logs the numeric code, the component and the caller-supplied context.
pub fn log_calibration_error(err: &CalibrationError, context: &str) {
    error!(
        "Calibration error in {}: code={}, component=CalibrationManager, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Calibration-related errors
///
/// The session itself never fails; these cover the stream lifecycle owned by
/// `CalibrationManager`.
#[derive(Debug, Clone, PartialEq)]
pub enum CalibrationError {
    /// Operation needs a running sensor stream
    StreamNotRunning,

    /// `start_stream` called while a stream is already running
    StreamAlreadyRunning,

    /// Calibration session mutex was poisoned
    StatePoisoned,
}

impl ErrorCode for CalibrationError {
    fn code(&self) -> i32 {
        match self {
            CalibrationError::StreamNotRunning => CalibrationErrorCodes::STREAM_NOT_RUNNING,
            CalibrationError::StreamAlreadyRunning => {
                CalibrationErrorCodes::STREAM_ALREADY_RUNNING
            }
            CalibrationError::StatePoisoned => CalibrationErrorCodes::STATE_POISONED,
        }
    }

    fn message(&self) -> String {
        match self {
            CalibrationError::StreamNotRunning => {
                "Sensor stream not running. Call start_stream() first.".to_string()
            }
            CalibrationError::StreamAlreadyRunning => "Sensor stream already running".to_string(),
            CalibrationError::StatePoisoned => "Calibration session lock poisoned".to_string(),
        }
    }
}

impl fmt::Display for CalibrationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CalibrationError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for CalibrationError {}
