// Profile documents - named snapshots of device settings
//
// On disk a profile is `{"profile_name_meta": <name>, "settings": {...}}`.
// Settings use the firmware parameter names plus the keyboard bindings and
// the OSK toggle. Older files hold the settings object bare, so loading
// accepts both shapes. Unknown keys are ignored and missing keys keep their
// defaults.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;

use crate::error::{log_profile_error, ProfileError};
use crate::settings::{DeviceSettings, KeyboardBindings, PARAM_ORDER, PRESSURE_KEY_SLOTS};

/// Placeholder names a front-end shows when no saved profile is selected
pub const RESERVED_NAMES: [&str; 2] = ["<Default Settings>", "<Default Settings Applied>"];

/// A named profile
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    pub name: String,
    pub settings: DeviceSettings,
    pub bindings: KeyboardBindings,
}

#[derive(Serialize, Deserialize)]
struct ProfileFile {
    profile_name_meta: String,
    settings: Map<String, Value>,
}

impl Profile {
    /// Create a profile, validating the name
    pub fn new(
        name: &str,
        settings: DeviceSettings,
        bindings: KeyboardBindings,
    ) -> Result<Self, ProfileError> {
        validate_name(name)?;
        Ok(Self {
            name: name.to_string(),
            settings,
            bindings,
        })
    }

    /// Factory settings under the given name
    pub fn factory(name: &str) -> Result<Self, ProfileError> {
        Self::new(name, DeviceSettings::default(), KeyboardBindings::default())
    }

    /// Parse a profile document
    ///
    /// `fallback_name` is used when the document carries no name (bare
    /// settings objects), typically the file stem.
    pub fn from_json(json: &str, fallback_name: &str) -> Result<Self, ProfileError> {
        let value: Value = serde_json::from_str(json).map_err(|err| ProfileError::ParseFailed {
            reason: err.to_string(),
        })?;
        let Value::Object(root) = value else {
            return Err(ProfileError::ParseFailed {
                reason: "profile must be a JSON object".to_string(),
            });
        };

        let name = root
            .get("profile_name_meta")
            .and_then(Value::as_str)
            .unwrap_or(fallback_name)
            .to_string();

        let settings_obj = match root.get("settings").cloned() {
            Some(Value::Object(inner)) => inner,
            Some(_) => {
                return Err(ProfileError::ParseFailed {
                    reason: "'settings' must be an object".to_string(),
                })
            }
            None => root,
        };

        let (settings, bindings) = settings_from_map(&settings_obj)?;
        Ok(Self {
            name,
            settings,
            bindings,
        })
    }

    /// Serialize to the wrapped document format
    pub fn to_json_pretty(&self) -> Result<String, ProfileError> {
        let file = ProfileFile {
            profile_name_meta: self.name.clone(),
            settings: settings_to_map(&self.settings, &self.bindings),
        };
        serde_json::to_string_pretty(&file).map_err(|err| ProfileError::ParseFailed {
            reason: err.to_string(),
        })
    }

    /// Read a profile from a file; the file stem names bare documents
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ProfileError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|err| {
            let err = ProfileError::IoFailed {
                path: path.display().to_string(),
                reason: err.to_string(),
            };
            log_profile_error(&err, "load_profile");
            err
        })?;

        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        let profile = Self::from_json(&contents, &stem).inspect_err(|err| {
            log_profile_error(err, "load_profile");
        })?;
        tracing::info!("[Profile] Loaded '{}' from {}", profile.name, path.display());
        Ok(profile)
    }

    /// Write the profile document to a file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ProfileError> {
        validate_name(&self.name)?;
        let path = path.as_ref();
        let json = self.to_json_pretty()?;
        fs::write(path, json).map_err(|err| {
            let err = ProfileError::IoFailed {
                path: path.display().to_string(),
                reason: err.to_string(),
            };
            log_profile_error(&err, "save_profile");
            err
        })?;
        tracing::info!("[Profile] Saved '{}' to {}", self.name, path.display());
        Ok(())
    }
}

/// Reject empty and placeholder names
pub fn validate_name(name: &str) -> Result<(), ProfileError> {
    if name.trim().is_empty() || RESERVED_NAMES.contains(&name) {
        return Err(ProfileError::InvalidName {
            name: name.to_string(),
        });
    }
    Ok(())
}

fn settings_to_map(settings: &DeviceSettings, bindings: &KeyboardBindings) -> Map<String, Value> {
    let mut map = Map::new();
    for (name, value) in settings.params() {
        map.insert(name.to_string(), Value::from(value));
    }
    map.insert(
        "osk_toggle_enabled".to_string(),
        Value::from(u8::from(settings.osk_enabled)),
    );
    map.insert(
        "num_sectors".to_string(),
        Value::from(bindings.num_sectors.to_string()),
    );
    map.insert(
        "sector_keys".to_string(),
        Value::from(bindings.sector_keys.to_vec()),
    );
    let pressure: Map<String, Value> = PRESSURE_KEY_SLOTS
        .iter()
        .zip(bindings.pressure_keys.iter())
        .map(|(slot, key)| (slot.to_string(), Value::from(key.clone())))
        .collect();
    map.insert("pressure_keys".to_string(), Value::Object(pressure));
    map
}

fn settings_from_map(
    map: &Map<String, Value>,
) -> Result<(DeviceSettings, KeyboardBindings), ProfileError> {
    let mut settings = DeviceSettings::default();
    let mut bindings = KeyboardBindings::default();

    for name in PARAM_ORDER {
        if let Some(value) = map.get(name) {
            settings.set(name, int_value(name, value)?);
        }
    }

    if let Some(value) = map.get("osk_toggle_enabled") {
        settings.osk_enabled = truthy(value);
    }

    if let Some(value) = map.get("num_sectors") {
        let count = int_value("num_sectors", value)?;
        bindings.num_sectors = u8::try_from(count).map_err(|_| ProfileError::InvalidValue {
            key: "num_sectors".to_string(),
            reason: format!("{} out of range", count),
        })?;
    }

    if let Some(value) = map.get("sector_keys") {
        let keys = value.as_array().ok_or_else(|| ProfileError::InvalidValue {
            key: "sector_keys".to_string(),
            reason: "expected a list of strings".to_string(),
        })?;
        for (idx, slot) in bindings.sector_keys.iter_mut().enumerate() {
            *slot = keys
                .get(idx)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
        }
    }

    if let Some(Value::Object(keys)) = map.get("pressure_keys") {
        for (slot, key) in keys {
            if let Some(key) = key.as_str() {
                bindings.set_pressure_key(slot, key);
            }
        }
    }

    Ok((settings, bindings))
}

/// Accept JSON numbers and numeric strings (older files store some as text)
fn int_value(key: &str, value: &Value) -> Result<i32, ProfileError> {
    let parsed = match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };

    parsed
        .and_then(|v| i32::try_from(v).ok())
        .ok_or_else(|| ProfileError::InvalidValue {
            key: key.to_string(),
            reason: format!("expected an integer, got {}", value),
        })
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty() && s != "0",
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_factory_round_trip() {
        let profile = Profile::factory("desk").unwrap();
        let json = profile.to_json_pretty().unwrap();
        assert!(json.contains("\"profile_name_meta\": \"desk\""));
        let loaded = Profile::from_json(&json, "ignored").unwrap();
        assert_eq!(loaded, profile);
    }

    #[test]
    fn test_wrapped_document() {
        let json = r#"{
            "profile_name_meta": "evening",
            "settings": {
                "HST": -260, "NMIN": -40, "NMAX": 20, "SPT": 70, "HPT": 230,
                "CSP": 14, "osk_toggle_enabled": 1, "num_sectors": "4",
                "sector_keys": ["right", "down", "left", "up"],
                "pressure_keys": {"HPT": "enter", "SST": "esc"}
            }
        }"#;
        let profile = Profile::from_json(json, "file").unwrap();
        assert_eq!(profile.name, "evening");
        assert_eq!(profile.settings.hst, -260);
        assert_eq!(profile.settings.csp, 14);
        assert_eq!(profile.settings.sad, 150);
        assert!(profile.settings.osk_enabled);
        assert_eq!(profile.bindings.num_sectors, 4);
        assert_eq!(profile.bindings.sector_keys[3], "up");
        // shorter key lists are padded with empty bindings
        assert_eq!(profile.bindings.sector_keys[4], "");
        assert_eq!(profile.bindings.pressure_key("HPT"), Some("enter"));
        assert_eq!(profile.bindings.pressure_key("SPT"), Some("r"));
        assert_eq!(profile.bindings.pressure_key("SST"), Some("esc"));
    }

    #[test]
    fn test_bare_settings_document_uses_fallback_name() {
        let profile = Profile::from_json(r#"{"JDZ": 35, "unknown": true}"#, "legacy").unwrap();
        assert_eq!(profile.name, "legacy");
        assert_eq!(profile.settings.jdz, 35);
        assert_eq!(profile.bindings, KeyboardBindings::default());
    }

    #[test]
    fn test_invalid_documents() {
        assert!(matches!(
            Profile::from_json("[1, 2]", "x").unwrap_err(),
            ProfileError::ParseFailed { .. }
        ));
        assert!(matches!(
            Profile::from_json("{", "x").unwrap_err(),
            ProfileError::ParseFailed { .. }
        ));
        assert!(matches!(
            Profile::from_json(r#"{"HST": "deep"}"#, "x").unwrap_err(),
            ProfileError::InvalidValue { .. }
        ));
        assert!(matches!(
            Profile::from_json(r#"{"settings": 3}"#, "x").unwrap_err(),
            ProfileError::ParseFailed { .. }
        ));
    }

    #[test]
    fn test_name_validation() {
        assert!(Profile::factory("").is_err());
        assert!(Profile::factory("   ").is_err());
        assert!(Profile::factory("<Default Settings>").is_err());
        assert!(Profile::factory("chair").is_ok());
    }

    #[test]
    fn test_save_and_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chair.json");

        let mut profile = Profile::factory("chair").unwrap();
        profile.settings.puff_sens = 80;
        profile.save(&path).unwrap();

        let loaded = Profile::load(&path).unwrap();
        assert_eq!(loaded, profile);
    }

    #[test]
    fn test_load_missing_file() {
        let err = Profile::load("/nonexistent/dir/p.json").unwrap_err();
        assert!(matches!(err, ProfileError::IoFailed { .. }));
    }
}
