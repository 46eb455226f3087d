// Profile document error types

use crate::error::ErrorCode;
use log::error;
use std::fmt;

/// Profile error code constants
///
/// Error code range: 4001-4004
pub struct ProfileErrorCodes {}

impl ProfileErrorCodes {
    /// Profile name empty or reserved
    pub const INVALID_NAME: i32 = 4001;

    /// Document is not valid JSON or has the wrong shape
    pub const PARSE_FAILED: i32 = 4002;

    /// Reading or writing the document failed
    pub const IO_FAILED: i32 = 4003;

    /// A setting value has the wrong type
    pub const INVALID_VALUE: i32 = 4004;
}

/// Log a profile error with structured context
pub fn log_profile_error(err: &ProfileError, context: &str) {
    error!(
        "Profile error in {}: code={}, component=Profile, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Errors raised while loading or saving profile documents
#[derive(Debug, Clone, PartialEq)]
pub enum ProfileError {
    /// Empty or placeholder profile name
    InvalidName { name: String },

    /// JSON could not be parsed
    ParseFailed { reason: String },

    /// File could not be read or written
    IoFailed { path: String, reason: String },

    /// Setting present but unusable
    InvalidValue { key: String, reason: String },
}

impl ErrorCode for ProfileError {
    fn code(&self) -> i32 {
        match self {
            ProfileError::InvalidName { .. } => ProfileErrorCodes::INVALID_NAME,
            ProfileError::ParseFailed { .. } => ProfileErrorCodes::PARSE_FAILED,
            ProfileError::IoFailed { .. } => ProfileErrorCodes::IO_FAILED,
            ProfileError::InvalidValue { .. } => ProfileErrorCodes::INVALID_VALUE,
        }
    }

    fn message(&self) -> String {
        match self {
            ProfileError::InvalidName { name } => format!("Invalid profile name '{}'", name),
            ProfileError::ParseFailed { reason } => {
                format!("Failed to parse profile: {}", reason)
            }
            ProfileError::IoFailed { path, reason } => {
                format!("Profile I/O failed for {}: {}", path, reason)
            }
            ProfileError::InvalidValue { key, reason } => {
                format!("Invalid value for '{}': {}", key, reason)
            }
        }
    }
}

impl fmt::Display for ProfileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ProfileError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for ProfileError {}
