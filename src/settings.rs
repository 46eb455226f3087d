// Device settings - the parameter table the firmware accepts
//
// Thresholds, timing, joystick and sensitivity parameters are plain integers
// keyed by their firmware names. Keyboard mode adds per-sector key bindings
// and keys for the pressure zones.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::calibration::ThresholdSet;

/// Firmware parameter names in the order they are pushed to the device
pub const PARAM_ORDER: [&str; 11] = [
    "HST", "NMIN", "NMAX", "SPT", "HPT", "SAD", "JDZ", "JMT", "CSP", "SIP_SENS", "PUFF_SENS",
];

/// Default key bindings for the eight joystick sectors (E, SE, S, SW, W, NW, N, NE)
pub const DEFAULT_SECTOR_KEYS: [&str; 8] = ["d", "d s", "s", "a s", "a", "a w", "w", "w d"];

/// Pressure zones that can be bound to a key in keyboard mode
pub const PRESSURE_KEY_SLOTS: [&str; 4] = ["HPT", "SPT", "HST", "SST"];

/// Joystick sector counts the firmware accepts
pub const SECTOR_COUNT_RANGE: std::ops::RangeInclusive<u8> = 2..=8;

/// Operating mode of the device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DeviceMode {
    #[default]
    Mouse,
    Keyboard,
}

impl fmt::Display for DeviceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceMode::Mouse => f.write_str("Mouse"),
            DeviceMode::Keyboard => f.write_str("Keyboard"),
        }
    }
}

impl FromStr for DeviceMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mouse" => Ok(DeviceMode::Mouse),
            "keyboard" => Ok(DeviceMode::Keyboard),
            other => Err(format!("unknown device mode '{}'", other)),
        }
    }
}

/// Integer parameters sent with `SET_<NAME>:<value>`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceSettings {
    /// Hard sip threshold
    pub hst: i32,
    /// Soft sip threshold / neutral lower edge
    pub nmin: i32,
    /// Neutral upper edge
    pub nmax: i32,
    /// Soft puff threshold
    pub spt: i32,
    /// Hard puff threshold
    pub hpt: i32,
    /// Sip/puff action delay (ms)
    pub sad: i32,
    /// Joystick dead zone
    pub jdz: i32,
    /// Joystick move threshold
    pub jmt: i32,
    /// Cursor speed
    pub csp: i32,
    /// Sip sensitivity scaling (percent)
    pub sip_sens: i32,
    /// Puff sensitivity scaling (percent)
    pub puff_sens: i32,
    /// Bottom-left corner toggles the on-screen keyboard
    pub osk_enabled: bool,
}

impl Default for DeviceSettings {
    fn default() -> Self {
        Self {
            hst: -200,
            nmin: -100,
            nmax: 25,
            spt: 100,
            hpt: 200,
            sad: 150,
            jdz: 20,
            jmt: 10,
            csp: 10,
            sip_sens: 100,
            puff_sens: 100,
            osk_enabled: false,
        }
    }
}

impl DeviceSettings {
    /// Look up a parameter by firmware name
    pub fn get(&self, name: &str) -> Option<i32> {
        let value = match name {
            "HST" => self.hst,
            "NMIN" => self.nmin,
            "NMAX" => self.nmax,
            "SPT" => self.spt,
            "HPT" => self.hpt,
            "SAD" => self.sad,
            "JDZ" => self.jdz,
            "JMT" => self.jmt,
            "CSP" => self.csp,
            "SIP_SENS" => self.sip_sens,
            "PUFF_SENS" => self.puff_sens,
            _ => return None,
        };
        Some(value)
    }

    /// Set a parameter by firmware name; returns false for unknown names
    pub fn set(&mut self, name: &str, value: i32) -> bool {
        let slot = match name {
            "HST" => &mut self.hst,
            "NMIN" => &mut self.nmin,
            "NMAX" => &mut self.nmax,
            "SPT" => &mut self.spt,
            "HPT" => &mut self.hpt,
            "SAD" => &mut self.sad,
            "JDZ" => &mut self.jdz,
            "JMT" => &mut self.jmt,
            "CSP" => &mut self.csp,
            "SIP_SENS" => &mut self.sip_sens,
            "PUFF_SENS" => &mut self.puff_sens,
            _ => return false,
        };
        *slot = value;
        true
    }

    /// All parameters as name/value pairs in push order
    pub fn params(&self) -> Vec<(&'static str, i32)> {
        PARAM_ORDER
            .iter()
            .filter_map(|&name| self.get(name).map(|value| (name, value)))
            .collect()
    }

    /// Current thresholds as a set
    pub fn thresholds(&self) -> ThresholdSet {
        ThresholdSet {
            hst: self.hst,
            nmin: self.nmin,
            nmax: self.nmax,
            spt: self.spt,
            hpt: self.hpt,
        }
    }

    /// Adopt a calibration suggestion; other parameters are untouched
    pub fn apply_thresholds(&mut self, thresholds: &ThresholdSet) {
        self.hst = thresholds.hst;
        self.nmin = thresholds.nmin;
        self.nmax = thresholds.nmax;
        self.spt = thresholds.spt;
        self.hpt = thresholds.hpt;
    }
}

/// Keyboard-mode bindings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyboardBindings {
    /// Joystick sectors in use, within `SECTOR_COUNT_RANGE`
    pub num_sectors: u8,
    /// Up to two whitespace separated keys per sector
    pub sector_keys: [String; 8],
    /// Keys for HPT, SPT, HST, SST in that order
    pub pressure_keys: [String; 4],
}

impl Default for KeyboardBindings {
    fn default() -> Self {
        Self {
            num_sectors: 8,
            sector_keys: DEFAULT_SECTOR_KEYS.map(str::to_string),
            pressure_keys: ["f", "r", "e", "q"].map(str::to_string),
        }
    }
}

impl KeyboardBindings {
    /// Binding for a pressure slot name
    pub fn pressure_key(&self, slot: &str) -> Option<&str> {
        PRESSURE_KEY_SLOTS
            .iter()
            .position(|&s| s == slot)
            .map(|idx| self.pressure_keys[idx].as_str())
    }

    /// Replace the binding for a pressure slot; returns false for unknown slots
    pub fn set_pressure_key(&mut self, slot: &str, key: &str) -> bool {
        match PRESSURE_KEY_SLOTS.iter().position(|&s| s == slot) {
            Some(idx) => {
                self.pressure_keys[idx] = key.to_string();
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_factory_defaults() {
        let settings = DeviceSettings::default();
        assert_eq!(settings.get("HST"), Some(-200));
        assert_eq!(settings.get("NMAX"), Some(25));
        assert_eq!(settings.get("SAD"), Some(150));
        assert_eq!(settings.get("PUFF_SENS"), Some(100));
        assert!(!settings.osk_enabled);
        assert!(settings.thresholds().is_ordered());
    }

    #[test]
    fn test_get_set_by_name() {
        let mut settings = DeviceSettings::default();
        assert!(settings.set("CSP", 25));
        assert_eq!(settings.csp, 25);
        assert!(!settings.set("BOGUS", 1));
        assert_eq!(settings.get("BOGUS"), None);
    }

    #[test]
    fn test_params_follow_push_order() {
        let names: Vec<&str> = DeviceSettings::default()
            .params()
            .into_iter()
            .map(|(name, _)| name)
            .collect();
        assert_eq!(names, PARAM_ORDER.to_vec());
    }

    #[test]
    fn test_apply_thresholds_leaves_other_params() {
        let mut settings = DeviceSettings {
            jdz: 33,
            ..DeviceSettings::default()
        };
        let set = ThresholdSet {
            hst: -240,
            nmin: -30,
            nmax: 18,
            spt: 60,
            hpt: 210,
        };
        settings.apply_thresholds(&set);
        assert_eq!(settings.thresholds(), set);
        assert_eq!(settings.jdz, 33);
    }

    #[test]
    fn test_keyboard_defaults() {
        let bindings = KeyboardBindings::default();
        assert_eq!(bindings.num_sectors, 8);
        assert_eq!(bindings.sector_keys[1], "d s");
        assert_eq!(bindings.pressure_key("HPT"), Some("f"));
        assert_eq!(bindings.pressure_key("SST"), Some("q"));
        assert_eq!(bindings.pressure_key("NMAX"), None);
    }

    #[test]
    fn test_mode_parse() {
        assert_eq!("keyboard".parse::<DeviceMode>(), Ok(DeviceMode::Keyboard));
        assert_eq!(" Mouse ".parse::<DeviceMode>(), Ok(DeviceMode::Mouse));
        assert!("gamepad".parse::<DeviceMode>().is_err());
    }
}
