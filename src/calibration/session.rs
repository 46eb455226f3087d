// CalibrationSession - per-action sample windows and threshold suggestions
//
// A session lives for as long as the sensor stream is running. The caller
// opens a recording window for one action at a time; every sample ingested
// while the window is open is attributed to that action. Closed windows are
// kept until the stream stops, and only the latest window per action counts.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::calibration::action::Action;
use crate::calibration::stats::ActionStats;
use crate::calibration::thresholds::{
    derive_thresholds, ActionAverages, DefaultThresholds, DerivationRules, NeutralBand,
    ThresholdSet,
};

/// Default recording window length
pub const DEFAULT_RECORDING_DURATION: Duration = Duration::from_millis(3000);

/// Identifies one opened recording window
///
/// Ids increase monotonically per id source, so a timer armed for an older
/// window can tell that it has been superseded. Sessions that share a source
/// (see `CalibrationSession::with_window_ids`) never reuse each other's ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct WindowId(pub u64);

/// Samples recorded for one action
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleWindow {
    pub action: Action,
    pub samples: Vec<i32>,
    /// Requested recording duration
    pub duration: Duration,
}

/// Completion notification for a closed window
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordingCompleted {
    pub action: Action,
    pub window_id: WindowId,
    pub sample_count: usize,
}

/// Result of an analysis pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdSuggestion {
    pub thresholds: ThresholdSet,
    pub neutral_band: NeutralBand,
    /// Stats for recorded actions only
    pub stats: BTreeMap<Action, ActionStats>,
}

#[derive(Debug)]
struct OpenWindow {
    id: WindowId,
    window: SampleWindow,
}

/// Owns recorded windows and derives ordered thresholds from them
#[derive(Debug)]
pub struct CalibrationSession {
    windows: BTreeMap<Action, SampleWindow>,
    open: Option<OpenWindow>,
    window_ids: Arc<AtomicU64>,
    current_value: Option<i32>,
    defaults: DefaultThresholds,
    rules: DerivationRules,
}

impl CalibrationSession {
    /// Create a session with explicit fallback table and derivation rules
    pub fn new(defaults: DefaultThresholds, rules: DerivationRules) -> Self {
        Self::with_window_ids(defaults, rules, Arc::new(AtomicU64::new(1)))
    }

    /// Create a session drawing window ids from a shared counter
    ///
    /// Owners that replace sessions over time pass the same counter to each,
    /// so an id from an earlier session never matches a later window.
    pub fn with_window_ids(
        defaults: DefaultThresholds,
        rules: DerivationRules,
        window_ids: Arc<AtomicU64>,
    ) -> Self {
        Self {
            windows: BTreeMap::new(),
            open: None,
            window_ids,
            current_value: None,
            defaults,
            rules: rules.normalized(),
        }
    }

    /// Create with factory defaults and the standard separation rules
    pub fn new_default() -> Self {
        Self::new(DefaultThresholds::default(), DerivationRules::default())
    }

    /// Open a new, empty window for `action`
    ///
    /// Any window still open is discarded without being stored. Returns the
    /// id of the new window.
    pub fn begin_recording(&mut self, action: Action, duration: Duration) -> WindowId {
        if let Some(previous) = self.open.take() {
            tracing::warn!(
                "[CalibrationSession] Recording for {} superseded by {} ({} samples discarded)",
                previous.window.action,
                action,
                previous.window.samples.len()
            );
        }

        let id = WindowId(self.window_ids.fetch_add(1, Ordering::Relaxed));

        self.open = Some(OpenWindow {
            id,
            window: SampleWindow {
                action,
                samples: Vec::new(),
                duration,
            },
        });

        tracing::debug!(
            "[CalibrationSession] Recording {} for {} ms (window {})",
            action,
            duration.as_millis(),
            id.0
        );
        id
    }

    /// Feed one raw sample from the device
    ///
    /// Always updates the live value; appends to the open window if any.
    /// Values are neither validated nor clamped.
    pub fn ingest_sample(&mut self, raw_value: i32) {
        self.current_value = Some(raw_value);
        if let Some(open) = self.open.as_mut() {
            open.window.samples.push(raw_value);
        }
    }

    /// Close the open window and store it for its action
    ///
    /// Replaces any earlier window for the same action. Returns `None` when
    /// no window is open.
    pub fn end_recording(&mut self) -> Option<RecordingCompleted> {
        let open = self.open.take()?;
        let completed = RecordingCompleted {
            action: open.window.action,
            window_id: open.id,
            sample_count: open.window.samples.len(),
        };

        tracing::info!(
            "[CalibrationSession] Collected {} samples for {}",
            completed.sample_count,
            completed.action
        );

        self.windows.insert(open.window.action, open.window);
        Some(completed)
    }

    /// Close the open window only if it is still `id`
    pub fn end_recording_window(&mut self, id: WindowId) -> Option<RecordingCompleted> {
        match &self.open {
            Some(open) if open.id == id => self.end_recording(),
            _ => {
                tracing::debug!(
                    "[CalibrationSession] Ignoring close for stale window {}",
                    id.0
                );
                None
            }
        }
    }

    /// Trimmed statistics for one action, zero if never recorded
    pub fn compute_stats(&self, action: Action) -> ActionStats {
        self.windows
            .get(&action)
            .map(|window| ActionStats::compute(&window.samples, self.rules.trim_fraction))
            .unwrap_or_else(ActionStats::zero)
    }

    /// Suggested ordered thresholds from the stored windows
    ///
    /// Actions without a window use the defaults table. Pure; repeated calls
    /// return the same result until new windows are stored.
    pub fn derive_thresholds(&self) -> ThresholdSet {
        self.derive().0
    }

    /// Thresholds together with the neutral band and the recorded stats
    pub fn suggest(&self) -> ThresholdSuggestion {
        let (thresholds, neutral_band) = self.derive();
        let stats = self
            .windows
            .keys()
            .map(|&action| (action, self.compute_stats(action)))
            .collect();

        ThresholdSuggestion {
            thresholds,
            neutral_band,
            stats,
        }
    }

    fn derive(&self) -> (ThresholdSet, NeutralBand) {
        let averages = ActionAverages::from_fn(|action| self.average_or_default(action));
        derive_thresholds(&averages, &self.rules)
    }

    fn average_or_default(&self, action: Action) -> i32 {
        if self.windows.contains_key(&action) {
            self.compute_stats(action).average
        } else {
            self.defaults.for_action(action)
        }
    }

    /// Action currently being recorded, if any
    pub fn open_action(&self) -> Option<Action> {
        self.open.as_ref().map(|open| open.window.action)
    }

    /// Id of the open window, if any
    pub fn open_window_id(&self) -> Option<WindowId> {
        self.open.as_ref().map(|open| open.id)
    }

    /// Number of samples in the open window so far
    pub fn open_sample_count(&self) -> usize {
        self.open
            .as_ref()
            .map(|open| open.window.samples.len())
            .unwrap_or(0)
    }

    /// Most recent sample seen, recorded or not
    pub fn current_value(&self) -> Option<i32> {
        self.current_value
    }

    /// Completed window for an action
    pub fn window(&self, action: Action) -> Option<&SampleWindow> {
        self.windows.get(&action)
    }

    /// Actions with a completed window, in recording order
    pub fn recorded_actions(&self) -> Vec<Action> {
        self.windows.keys().copied().collect()
    }

    /// Whether any window has been completed
    pub fn has_data(&self) -> bool {
        !self.windows.is_empty()
    }

    /// Fallback table used for unrecorded actions
    pub fn defaults(&self) -> &DefaultThresholds {
        &self.defaults
    }

    /// Derivation rules in effect (already normalized)
    pub fn rules(&self) -> &DerivationRules {
        &self.rules
    }

    /// Drop all windows and the live value
    pub fn clear(&mut self) {
        self.windows.clear();
        self.open = None;
        self.current_value = None;
    }
}

impl Default for CalibrationSession {
    fn default() -> Self {
        Self::new_default()
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
