// Device protocol error types

use crate::error::ErrorCode;
use log::error;
use std::fmt;

/// Protocol error code constants
///
/// Error code range: 3001-3004
pub struct ProtocolErrorCodes {}

impl ProtocolErrorCodes {
    /// Line has a known prefix but an unusable payload
    pub const MALFORMED_LINE: i32 = 3001;

    /// Numeric field failed to parse
    pub const INVALID_NUMBER: i32 = 3002;

    /// Key binding does not map to a key code
    pub const INVALID_KEY: i32 = 3003;

    /// Joystick sector count not supported by the firmware
    pub const INVALID_SECTOR_COUNT: i32 = 3004;
}

/// Log a protocol error with structured context
pub fn log_protocol_error(err: &ProtocolError, context: &str) {
    error!(
        "Protocol error in {}: code={}, component=DeviceProtocol, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Errors raised while decoding device lines or encoding commands
#[derive(Debug, Clone, PartialEq)]
pub enum ProtocolError {
    /// Known prefix, unusable payload
    MalformedLine { line: String, reason: String },

    /// A numeric field did not parse
    InvalidNumber { field: String, value: String },

    /// A key binding string is not a known key
    InvalidKey { slot: String, key: String },

    /// Sector count outside 2..=8
    InvalidSectorCount { count: u8 },
}

impl ErrorCode for ProtocolError {
    fn code(&self) -> i32 {
        match self {
            ProtocolError::MalformedLine { .. } => ProtocolErrorCodes::MALFORMED_LINE,
            ProtocolError::InvalidNumber { .. } => ProtocolErrorCodes::INVALID_NUMBER,
            ProtocolError::InvalidKey { .. } => ProtocolErrorCodes::INVALID_KEY,
            ProtocolError::InvalidSectorCount { .. } => ProtocolErrorCodes::INVALID_SECTOR_COUNT,
        }
    }

    fn message(&self) -> String {
        match self {
            ProtocolError::MalformedLine { line, reason } => {
                format!("Malformed device line '{}': {}", line, reason)
            }
            ProtocolError::InvalidNumber { field, value } => {
                format!("Invalid number for {}: '{}'", field, value)
            }
            ProtocolError::InvalidKey { slot, key } => {
                format!("Key '{}' for {} is not a valid key", key, slot)
            }
            ProtocolError::InvalidSectorCount { count } => {
                format!("Sector count must be between 2 and 8 (got {})", count)
            }
        }
    }
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ProtocolError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for ProtocolError {}
