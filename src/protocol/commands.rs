//! Encoding of commands sent to the device.

use std::fmt;

use crate::error::ProtocolError;
use crate::protocol::keycodes::{key_code, sector_key_codes};
use crate::settings::{
    DeviceMode, DeviceSettings, KeyboardBindings, PRESSURE_KEY_SLOTS, SECTOR_COUNT_RANGE,
};

/// One command line understood by the firmware
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceCommand {
    SetMode(DeviceMode),
    StartCalibration,
    StopCalibration,
    /// `SET_<NAME>:<value>`
    SetParam { name: String, value: i32 },
    /// `SET_KEY_<SLOT>:<code>`
    SetPressureKey { slot: String, code: u8 },
    /// `SET_NUM_SECTORS:<n>`
    SetNumSectors(u8),
    /// `SET_JOY_KEY:<sector>,<code1>,<code2>`
    SetJoyKey { sector: usize, code1: u8, code2: u8 },
}

impl DeviceCommand {
    /// Encoded line including the trailing newline
    pub fn to_line(&self) -> String {
        format!("{}\n", self)
    }
}

impl fmt::Display for DeviceCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceCommand::SetMode(DeviceMode::Mouse) => f.write_str("SET_MODE_MOUSE"),
            DeviceCommand::SetMode(DeviceMode::Keyboard) => f.write_str("SET_MODE_KEYBOARD"),
            DeviceCommand::StartCalibration => f.write_str("START_CALIBRATION"),
            DeviceCommand::StopCalibration => f.write_str("STOP_CALIBRATION"),
            DeviceCommand::SetParam { name, value } => write!(f, "SET_{}:{}", name, value),
            DeviceCommand::SetPressureKey { slot, code } => write!(f, "SET_KEY_{}:{}", slot, code),
            DeviceCommand::SetNumSectors(n) => write!(f, "SET_NUM_SECTORS:{}", n),
            DeviceCommand::SetJoyKey {
                sector,
                code1,
                code2,
            } => write!(f, "SET_JOY_KEY:{},{},{}", sector, code1, code2),
        }
    }
}

/// Commands that push every parameter, plus key bindings in keyboard mode
///
/// Nothing is returned on a binding error, so a partially applied keyboard
/// layout never reaches the device.
pub fn apply_all_plan(
    settings: &DeviceSettings,
    bindings: &KeyboardBindings,
    mode: DeviceMode,
) -> Result<Vec<DeviceCommand>, ProtocolError> {
    let mut commands: Vec<DeviceCommand> = settings
        .params()
        .into_iter()
        .map(|(name, value)| DeviceCommand::SetParam {
            name: name.to_string(),
            value,
        })
        .collect();

    if mode == DeviceMode::Keyboard {
        commands.extend(keyboard_plan(bindings)?);
    }

    Ok(commands)
}

/// Commands for the keyboard-mode bindings
pub fn keyboard_plan(bindings: &KeyboardBindings) -> Result<Vec<DeviceCommand>, ProtocolError> {
    if !SECTOR_COUNT_RANGE.contains(&bindings.num_sectors) {
        return Err(ProtocolError::InvalidSectorCount {
            count: bindings.num_sectors,
        });
    }

    let mut commands = Vec::with_capacity(PRESSURE_KEY_SLOTS.len() + 1 + 8);

    for (slot, key) in PRESSURE_KEY_SLOTS.iter().zip(bindings.pressure_keys.iter()) {
        let code = key_code(key).ok_or_else(|| ProtocolError::InvalidKey {
            slot: slot.to_string(),
            key: key.clone(),
        })?;
        commands.push(DeviceCommand::SetPressureKey {
            slot: slot.to_string(),
            code,
        });
    }

    commands.push(DeviceCommand::SetNumSectors(bindings.num_sectors));

    for (sector, binding) in bindings
        .sector_keys
        .iter()
        .take(bindings.num_sectors as usize)
        .enumerate()
    {
        let (code1, code2) = sector_key_codes(sector, binding)?;
        commands.push(DeviceCommand::SetJoyKey {
            sector,
            code1,
            code2,
        });
    }

    Ok(commands)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encoding() {
        assert_eq!(
            DeviceCommand::SetMode(DeviceMode::Keyboard).to_line(),
            "SET_MODE_KEYBOARD\n"
        );
        assert_eq!(DeviceCommand::StartCalibration.to_line(), "START_CALIBRATION\n");
        assert_eq!(DeviceCommand::StopCalibration.to_string(), "STOP_CALIBRATION");
        assert_eq!(
            DeviceCommand::SetParam {
                name: "HST".to_string(),
                value: -220
            }
            .to_string(),
            "SET_HST:-220"
        );
        assert_eq!(
            DeviceCommand::SetPressureKey {
                slot: "SST".to_string(),
                code: 113
            }
            .to_string(),
            "SET_KEY_SST:113"
        );
        assert_eq!(
            DeviceCommand::SetJoyKey {
                sector: 3,
                code1: 97,
                code2: 115
            }
            .to_string(),
            "SET_JOY_KEY:3,97,115"
        );
    }

    #[test]
    fn test_mouse_plan_is_params_only() {
        let plan = apply_all_plan(
            &DeviceSettings::default(),
            &KeyboardBindings::default(),
            DeviceMode::Mouse,
        )
        .unwrap();
        assert_eq!(plan.len(), 11);
        assert_eq!(plan[0].to_string(), "SET_HST:-200");
        assert_eq!(plan[10].to_string(), "SET_PUFF_SENS:100");
    }

    #[test]
    fn test_keyboard_plan_defaults() {
        let plan = apply_all_plan(
            &DeviceSettings::default(),
            &KeyboardBindings::default(),
            DeviceMode::Keyboard,
        )
        .unwrap();
        // 11 params + 4 pressure keys + sector count + 8 sectors
        assert_eq!(plan.len(), 24);
        assert_eq!(plan[11].to_string(), "SET_KEY_HPT:102");
        assert_eq!(plan[15].to_string(), "SET_NUM_SECTORS:8");
        assert_eq!(plan[16].to_string(), "SET_JOY_KEY:0,100,32");
        assert_eq!(plan[17].to_string(), "SET_JOY_KEY:1,100,115");
    }

    #[test]
    fn test_four_sector_plan_only_sends_four_sectors() {
        let bindings = KeyboardBindings {
            num_sectors: 4,
            ..KeyboardBindings::default()
        };
        let plan = keyboard_plan(&bindings).unwrap();
        let joy = plan
            .iter()
            .filter(|cmd| matches!(cmd, DeviceCommand::SetJoyKey { .. }))
            .count();
        assert_eq!(joy, 4);
    }

    #[test]
    fn test_every_supported_sector_count_is_accepted() {
        for count in 2..=8u8 {
            let bindings = KeyboardBindings {
                num_sectors: count,
                ..KeyboardBindings::default()
            };
            let plan = keyboard_plan(&bindings).unwrap();
            // 4 pressure keys + sector count + one line per sector
            assert_eq!(plan.len(), 5 + count as usize);
            assert!(plan.contains(&DeviceCommand::SetNumSectors(count)));
        }
    }

    #[test]
    fn test_invalid_bindings_abort_plan() {
        let mut bindings = KeyboardBindings::default();
        bindings.set_pressure_key("HST", "hyper");
        let err = keyboard_plan(&bindings).unwrap_err();
        assert!(matches!(err, ProtocolError::InvalidKey { slot, .. } if slot == "HST"));

        for count in [0, 1, 9] {
            let bindings = KeyboardBindings {
                num_sectors: count,
                ..KeyboardBindings::default()
            };
            assert_eq!(
                keyboard_plan(&bindings).unwrap_err(),
                ProtocolError::InvalidSectorCount { count }
            );
        }

        let mut bindings = KeyboardBindings::default();
        bindings.sector_keys[7] = String::new();
        assert!(keyboard_plan(&bindings).is_err());
    }
}
