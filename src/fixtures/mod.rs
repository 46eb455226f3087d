//! Fixture utilities for deterministic calibration runs.
//!
//! This module generates synthetic gesture windows, loads recorded window
//! sets from JSON and replays captured device logs through a
//! `CalibrationSession`. It backs the CLI harness and the tests, so no
//! device is needed to exercise the calibration pipeline.
//!
//! Capture log format, one entry per line:
//! - device lines as sent by the firmware (`CALIB_P:-80`, `JOY:0,0`, ...)
//! - `!record <action>` opens a recording window
//! - `!end` closes it
//! - `#` starts a comment

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::calibration::{Action, CalibrationSession, RecordingCompleted};
use crate::telemetry::LiveTelemetry;

/// Recorded windows keyed by action label
pub type CaptureWindows = BTreeMap<Action, Vec<i32>>;

/// Load a window set such as `{"Neutral": [0, 1], "Soft Sip": [-80]}`
pub fn load_windows<P: AsRef<Path>>(path: P) -> Result<CaptureWindows> {
    let path = path.as_ref();
    let contents =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("parsing {}", path.display()))
}

/// Record every window of `windows` into `session`, in action order
pub fn record_windows(
    session: &mut CalibrationSession,
    windows: &CaptureWindows,
    duration: Duration,
) -> Vec<RecordingCompleted> {
    let mut completed = Vec::with_capacity(windows.len());
    for (&action, samples) in windows {
        session.begin_recording(action, duration);
        for &sample in samples {
            session.ingest_sample(sample);
        }
        completed.extend(session.end_recording());
    }
    completed
}

/// Interval between pressure reports from the firmware
pub const SAMPLE_INTERVAL_MS: u64 = 20;

/// Target levels and noise for synthetic gestures
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureProfile {
    pub neutral: i32,
    pub soft_sip: i32,
    pub hard_sip: i32,
    pub soft_puff: i32,
    pub hard_puff: i32,
    /// Peak noise amplitude around the held level
    pub jitter: i32,
    /// Samples per recording window
    pub samples_per_window: usize,
    /// Share of the window spent ramping in and out at each end
    pub ramp_fraction: f64,
}

impl Default for GestureProfile {
    fn default() -> Self {
        Self {
            neutral: 3,
            soft_sip: -90,
            hard_sip: -260,
            soft_puff: 85,
            hard_puff: 270,
            jitter: 6,
            samples_per_window: (3000 / SAMPLE_INTERVAL_MS) as usize,
            ramp_fraction: 0.08,
        }
    }
}

impl GestureProfile {
    /// Default levels with as many samples as a window of `window_ms` holds
    pub fn for_window(window_ms: u64) -> Self {
        Self {
            samples_per_window: (window_ms / SAMPLE_INTERVAL_MS).max(1) as usize,
            ..Self::default()
        }
    }

    pub fn level(&self, action: Action) -> i32 {
        match action {
            Action::Neutral => self.neutral,
            Action::SoftSip => self.soft_sip,
            Action::HardSip => self.hard_sip,
            Action::SoftPuff => self.soft_puff,
            Action::HardPuff => self.hard_puff,
        }
    }
}

/// Seeded generator of human-like gesture windows
pub struct SyntheticGestures {
    rng: StdRng,
    profile: GestureProfile,
}

impl SyntheticGestures {
    pub fn new(seed: u64, profile: GestureProfile) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            profile,
        }
    }

    pub fn profile(&self) -> &GestureProfile {
        &self.profile
    }

    /// One window: ramp from rest to the held level, hold with jitter, ramp back
    pub fn window(&mut self, action: Action) -> Vec<i32> {
        let len = self.profile.samples_per_window;
        let rest = self.profile.neutral;
        let target = self.profile.level(action);
        let jitter = self.profile.jitter.max(0);
        let ramp = ((len as f64 * self.profile.ramp_fraction.clamp(0.0, 0.5)) as usize).max(1);

        (0..len)
            .map(|i| {
                let from_edge = i.min(len - 1 - i);
                let level = if from_edge < ramp {
                    let t = from_edge as f64 / ramp as f64;
                    rest + ((target - rest) as f64 * t) as i32
                } else {
                    target
                };
                // sum of two uniforms peaks around the held level
                let noise =
                    self.rng.gen_range(-jitter..=jitter) + self.rng.gen_range(-jitter..=jitter);
                level + noise / 2
            })
            .collect()
    }

    /// One window per action
    pub fn capture(&mut self) -> CaptureWindows {
        Action::ALL
            .iter()
            .map(|&action| (action, self.window(action)))
            .collect()
    }
}

/// Render windows as a replayable capture log
pub fn render_capture(windows: &CaptureWindows) -> String {
    let mut out = String::from("# synthetic calibration capture\n");
    for (action, samples) in windows {
        out.push_str(&format!("!record {}\n", action));
        for sample in samples {
            out.push_str(&format!("CALIB_P:{}\n", sample));
        }
        out.push_str("!end\n");
    }
    out
}

/// Outcome of replaying a capture log
#[derive(Debug, Clone, Default, Serialize)]
pub struct ReplayReport {
    pub lines: usize,
    pub samples_ingested: usize,
    pub superseded: usize,
    pub dropped_lines: u64,
    pub completed: Vec<RecordingCompleted>,
}

/// Replay a capture log through telemetry routing into `session`
///
/// A window still open at the end of the log is closed, as its timer would
/// have done.
pub fn replay_capture(
    log: &str,
    session: &mut CalibrationSession,
    telemetry: &mut LiveTelemetry,
    duration: Duration,
) -> Result<ReplayReport> {
    let mut report = ReplayReport::default();
    telemetry.set_calibrating(true);

    for (idx, raw) in log.lines().enumerate() {
        report.lines += 1;
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if let Some(directive) = line.strip_prefix('!') {
            let (verb, arg) = directive
                .split_once(char::is_whitespace)
                .map(|(v, a)| (v, a.trim()))
                .unwrap_or((directive, ""));
            match verb {
                "record" => {
                    let action: Action = arg
                        .parse()
                        .map_err(|err: String| anyhow!("line {}: {}", idx + 1, err))?;
                    if session.open_action().is_some() {
                        report.superseded += 1;
                    }
                    session.begin_recording(action, duration);
                }
                "end" => report.completed.extend(session.end_recording()),
                other => bail!("line {}: unknown directive '!{}'", idx + 1, other),
            }
            continue;
        }

        if let Some(sample) = telemetry.observe_line(line) {
            session.ingest_sample(sample);
            report.samples_ingested += 1;
        }
    }

    report.completed.extend(session.end_recording());
    report.dropped_lines = telemetry.snapshot().dropped_lines;
    Ok(report)
}
