//! Timing of the command burst sent when a device connects.
//!
//! The firmware needs a settle period after the port opens (the board resets
//! on connect), takes the mode first, and drops commands that arrive closer
//! together than the configured spacing.

use std::time::Duration;

use serde::Serialize;

use crate::config::DeviceConfig;
use crate::error::ProtocolError;
use crate::protocol::commands::{apply_all_plan, DeviceCommand};
use crate::settings::{DeviceMode, DeviceSettings, KeyboardBindings};

/// One command line and when to send it, relative to opening the port
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScheduledCommand {
    pub at_ms: u64,
    pub line: String,
}

impl ScheduledCommand {
    pub fn at(&self) -> Duration {
        Duration::from_millis(self.at_ms)
    }
}

/// Everything a transport needs to bring a device up to date
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectSchedule {
    pub baud_rate: u32,
    pub commands: Vec<ScheduledCommand>,
}

/// Space `commands` by `spacing_ms`, the first one at `start_ms`
pub fn pace(commands: &[DeviceCommand], start_ms: u64, spacing_ms: u64) -> Vec<ScheduledCommand> {
    commands
        .iter()
        .enumerate()
        .map(|(idx, command)| ScheduledCommand {
            at_ms: start_ms.saturating_add(spacing_ms.saturating_mul(idx as u64)),
            line: command.to_string(),
        })
        .collect()
}

/// Mode after the settle delay, then the full settings plan
///
/// Fails without scheduling anything when the keyboard bindings are invalid.
pub fn connect_schedule(
    settings: &DeviceSettings,
    bindings: &KeyboardBindings,
    mode: DeviceMode,
    device: &DeviceConfig,
) -> Result<ConnectSchedule, ProtocolError> {
    let plan = apply_all_plan(settings, bindings, mode)?;

    let mut commands = vec![ScheduledCommand {
        at_ms: device.settle_ms,
        line: DeviceCommand::SetMode(mode).to_string(),
    }];
    commands.extend(pace(
        &plan,
        device.settle_ms.saturating_add(device.initial_apply_delay_ms),
        device.command_spacing_ms,
    ));

    Ok(ConnectSchedule {
        baud_rate: device.baud_rate,
        commands,
    })
}
