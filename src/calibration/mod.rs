// Calibration module - recording windows and threshold derivation
//
// This module provides three main components:
// 1. CalibrationSession: per-action sample windows collected from the live
//    sensor stream
// 2. ActionStats: trimmed statistics over one window
// 3. derive_thresholds: ordered five-value threshold suggestion
//
// The calibration workflow:
// 1. Start the sensor stream and create a session
// 2. Record a ~3 s window for each action (Neutral, Soft/Hard Sip, Soft/Hard Puff)
// 3. Analyze to get suggested thresholds; the user may still hand-edit them

pub mod action;
pub mod session;
pub mod stats;
pub mod thresholds;

pub use action::Action;
pub use session::{
    CalibrationSession, RecordingCompleted, SampleWindow, ThresholdSuggestion, WindowId,
    DEFAULT_RECORDING_DURATION,
};
pub use stats::{trim_count, ActionStats, DEFAULT_TRIM_FRACTION};
pub use thresholds::{
    derive_thresholds, ActionAverages, DefaultThresholds, DerivationRules, NeutralBand,
    ThresholdSet,
};
