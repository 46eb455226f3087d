// Calibration actions
//
// The fixed set of physical gestures a user performs while the sensor
// stream is running. Sip gestures read negative, puff gestures positive.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A physical action recorded during calibration
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Action {
    /// Resting, no pressure applied
    #[serde(rename = "Neutral")]
    Neutral,
    /// Gentle suction
    #[serde(rename = "Soft Sip")]
    SoftSip,
    /// Strong suction
    #[serde(rename = "Hard Sip")]
    HardSip,
    /// Gentle blow
    #[serde(rename = "Soft Puff")]
    SoftPuff,
    /// Strong blow
    #[serde(rename = "Hard Puff")]
    HardPuff,
}

impl Action {
    /// All actions in recording order
    pub const ALL: [Action; 5] = [
        Action::Neutral,
        Action::SoftSip,
        Action::HardSip,
        Action::SoftPuff,
        Action::HardPuff,
    ];

    /// Get human-readable name for display
    pub fn display_name(&self) -> &'static str {
        match self {
            Action::Neutral => "Neutral",
            Action::SoftSip => "Soft Sip",
            Action::HardSip => "Hard Sip",
            Action::SoftPuff => "Soft Puff",
            Action::HardPuff => "Hard Puff",
        }
    }

    /// Whether this action pulls the sensor negative
    pub fn is_sip(&self) -> bool {
        matches!(self, Action::SoftSip | Action::HardSip)
    }

    /// Whether this action pushes the sensor positive
    pub fn is_puff(&self) -> bool {
        matches!(self, Action::SoftPuff | Action::HardPuff)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for Action {
    type Err = String;

    /// Accepts display labels as well as `soft-sip` / `soft_sip` / `softsip`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| !matches!(c, ' ' | '-' | '_'))
            .flat_map(char::to_lowercase)
            .collect();

        match normalized.as_str() {
            "neutral" => Ok(Action::Neutral),
            "softsip" => Ok(Action::SoftSip),
            "hardsip" => Ok(Action::HardSip),
            "softpuff" => Ok(Action::SoftPuff),
            "hardpuff" => Ok(Action::HardPuff),
            _ => Err(format!("unknown calibration action '{}'", s)),
        }
    }
}
