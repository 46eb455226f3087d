// Managers Module
//
// Long-lived owners of shared runtime state.
// - CalibrationManager: calibration session, recording timer and completion events

pub mod calibration_manager;

pub use calibration_manager::{CalibrationManager, RecordingEvent};
