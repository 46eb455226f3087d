use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use puff_tuner::calibration::{Action, ActionStats, CalibrationSession, ThresholdSet};
use puff_tuner::config::AppConfig;
use puff_tuner::fixtures::{
    load_windows, record_windows, render_capture, replay_capture, GestureProfile, ReplayReport,
    SyntheticGestures,
};
use puff_tuner::profile::Profile;
use puff_tuner::protocol::{apply_all_plan, connect_schedule, DeviceCommand};
use puff_tuner::settings::{DeviceMode, DeviceSettings, KeyboardBindings};
use puff_tuner::telemetry::LiveTelemetry;
use puff_tuner::ThresholdSuggestion;
use serde::Serialize;

#[derive(Parser, Debug)]
#[command(
    name = "puff_cli",
    about = "Offline calibration and command harness for sip/puff controllers"
)]
struct Cli {
    /// Config file (defaults to assets/puff_config.json, falling back to built-ins)
    #[arg(long)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Derive thresholds from recorded windows ({"Neutral": [..], "Soft Sip": [..], ...})
    Analyze {
        #[arg(long)]
        windows: PathBuf,
        /// Expected thresholds; exit code 2 on mismatch
        #[arg(long)]
        expect: Option<PathBuf>,
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Replay a captured device log through the calibration pipeline
    Replay {
        #[arg(long)]
        log: PathBuf,
    },
    /// Print the command lines that push a profile to the device
    Commands {
        #[arg(long)]
        profile: PathBuf,
        #[arg(long, default_value = "mouse")]
        mode: DeviceMode,
        /// Emit the timed connect sequence as JSON using the device config
        #[arg(long)]
        paced: bool,
    },
    /// Run a calibration against synthetic gestures
    Simulate {
        #[arg(long, default_value_t = 0)]
        seed: u64,
        /// Also write the generated capture log here
        #[arg(long)]
        log: Option<PathBuf>,
    },
    /// Print built-in configuration and factory settings
    Defaults,
}

#[derive(Serialize)]
struct AnalysisReport {
    /// Every action, zero for the unrecorded ones
    stats: BTreeMap<Action, ActionStats>,
    suggestion: ThresholdSuggestion,
    ordered: bool,
}

#[derive(Serialize)]
struct ThresholdDiff {
    failures: Vec<String>,
}

#[derive(Serialize)]
struct ReplayOutput {
    report: ReplayReport,
    suggestion: ThresholdSuggestion,
}

#[derive(Serialize)]
struct DefaultsOutput {
    config: AppConfig,
    settings: DeviceSettings,
    bindings: KeyboardBindings,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:?}");
            ExitCode::from(1)
        }
    }
}

fn run() -> Result<ExitCode> {
    let cli = Cli::parse();
    let config = cli
        .config
        .map(AppConfig::load_from_file)
        .unwrap_or_else(AppConfig::load);

    match cli.command {
        Commands::Analyze {
            windows,
            expect,
            output,
        } => run_analyze(&config, &windows, expect, output),
        Commands::Replay { log } => run_replay(&config, &log),
        Commands::Commands {
            profile,
            mode,
            paced,
        } => run_commands(&config, &profile, mode, paced),
        Commands::Simulate { seed, log } => run_simulate(&config, seed, log),
        Commands::Defaults => run_defaults(&config),
    }
}

fn new_session(config: &AppConfig) -> CalibrationSession {
    CalibrationSession::new(config.calibration.defaults, config.calibration.rules)
}

fn run_analyze(
    config: &AppConfig,
    windows_path: &Path,
    expect: Option<PathBuf>,
    output_path: Option<PathBuf>,
) -> Result<ExitCode> {
    let windows = load_windows(windows_path)?;
    let mut session = new_session(config);
    record_windows(&mut session, &windows, config.calibration.window_duration());

    let report = AnalysisReport {
        stats: Action::ALL
            .iter()
            .map(|&action| (action, session.compute_stats(action)))
            .collect(),
        ordered: session.derive_thresholds().is_ordered(),
        suggestion: session.suggest(),
    };
    emit_json(&report, output_path)?;

    match expect {
        Some(path) => {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("reading {}", path.display()))?;
            let expected: ThresholdSet = serde_json::from_str(&contents)
                .with_context(|| format!("parsing {}", path.display()))?;
            let failures = threshold_failures(&expected, &report.suggestion.thresholds);
            if failures.is_empty() {
                Ok(ExitCode::from(0))
            } else {
                eprintln!(
                    "{}",
                    serde_json::to_string_pretty(&ThresholdDiff { failures })?
                );
                Ok(ExitCode::from(2))
            }
        }
        None => Ok(ExitCode::from(0)),
    }
}

fn threshold_failures(expected: &ThresholdSet, actual: &ThresholdSet) -> Vec<String> {
    expected
        .as_params()
        .iter()
        .zip(actual.as_params().iter())
        .filter(|(e, a)| e.1 != a.1)
        .map(|(e, a)| format!("{}: expected {}, got {}", e.0, e.1, a.1))
        .collect()
}

fn run_replay(config: &AppConfig, log_path: &Path) -> Result<ExitCode> {
    let log = fs::read_to_string(log_path)
        .with_context(|| format!("reading {}", log_path.display()))?;
    let mut session = new_session(config);
    let mut telemetry = LiveTelemetry::new(&config.telemetry);
    let report = replay_capture(
        &log,
        &mut session,
        &mut telemetry,
        config.calibration.window_duration(),
    )
    .with_context(|| format!("replaying {}", log_path.display()))?;

    emit_json(
        &ReplayOutput {
            report,
            suggestion: session.suggest(),
        },
        None,
    )?;
    Ok(ExitCode::from(0))
}

fn run_commands(
    config: &AppConfig,
    profile_path: &Path,
    mode: DeviceMode,
    paced: bool,
) -> Result<ExitCode> {
    let profile = Profile::load(profile_path)
        .with_context(|| format!("loading profile {}", profile_path.display()))?;

    if paced {
        let schedule =
            connect_schedule(&profile.settings, &profile.bindings, mode, &config.device)
                .with_context(|| format!("building commands for '{}'", profile.name))?;
        emit_json(&schedule, None)?;
        return Ok(ExitCode::from(0));
    }

    let plan = apply_all_plan(&profile.settings, &profile.bindings, mode)
        .with_context(|| format!("building commands for '{}'", profile.name))?;

    println!("{}", DeviceCommand::SetMode(mode));
    for command in plan {
        println!("{command}");
    }
    Ok(ExitCode::from(0))
}

fn run_simulate(config: &AppConfig, seed: u64, log_path: Option<PathBuf>) -> Result<ExitCode> {
    let profile = GestureProfile::for_window(config.calibration.window_ms);
    let windows = SyntheticGestures::new(seed, profile).capture();

    if let Some(path) = log_path {
        fs::write(&path, render_capture(&windows))
            .with_context(|| format!("writing {}", path.display()))?;
    }

    let mut session = new_session(config);
    record_windows(&mut session, &windows, config.calibration.window_duration());
    emit_json(&session.suggest(), None)?;
    Ok(ExitCode::from(0))
}

fn run_defaults(config: &AppConfig) -> Result<ExitCode> {
    emit_json(
        &DefaultsOutput {
            config: config.clone(),
            settings: DeviceSettings::default(),
            bindings: KeyboardBindings::default(),
        },
        None,
    )?;
    Ok(ExitCode::from(0))
}

fn emit_json<T: Serialize>(value: &T, output_path: Option<PathBuf>) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    if let Some(path) = output_path {
        fs::write(&path, &json).with_context(|| format!("writing {}", path.display()))?;
    } else {
        println!("{json}");
    }
    Ok(())
}
