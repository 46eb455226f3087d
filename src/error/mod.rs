// Error types for the puff tuner
//
// This module defines custom error types for the calibration manager, the
// device line protocol and profile documents. Each carries a numeric code so
// front-ends can map failures without string matching.

mod calibration;
mod profile;
mod protocol;

pub use calibration::{log_calibration_error, CalibrationError, CalibrationErrorCodes};
pub use profile::{log_profile_error, ProfileError, ProfileErrorCodes};
pub use protocol::{log_protocol_error, ProtocolError, ProtocolErrorCodes};

/// Error codes for structured error reporting
///
/// This trait provides a standard way to get error codes and messages
/// from custom error types, enabling consistent error handling across
/// front-ends.
pub trait ErrorCode {
    /// Get the numeric error code
    fn code(&self) -> i32;

    /// Get the human-readable error message
    fn message(&self) -> String;
}
