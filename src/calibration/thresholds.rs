// Threshold derivation
//
// Turns per-action averages into the five pressure cut-points the firmware
// uses. Measured averages act as bounds that are pulled onto a minimum
// separation lattice anchored at the neutral band, so the result is ordered
// even when the recorded gestures were noisy or performed out of order.

use serde::{Deserialize, Serialize};

use crate::calibration::action::Action;
use crate::calibration::stats::DEFAULT_TRIM_FRACTION;

/// The five pressure thresholds sent to the device
///
/// Invariant once derived: `hst < nmin <= nmax < spt < hpt`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThresholdSet {
    /// Hard sip threshold
    #[serde(rename = "HST")]
    pub hst: i32,
    /// Soft sip threshold, the lower edge of the neutral zone
    #[serde(rename = "NMIN")]
    pub nmin: i32,
    /// Upper edge of the neutral zone
    #[serde(rename = "NMAX")]
    pub nmax: i32,
    /// Soft puff threshold
    #[serde(rename = "SPT")]
    pub spt: i32,
    /// Hard puff threshold
    #[serde(rename = "HPT")]
    pub hpt: i32,
}

impl ThresholdSet {
    /// Check the ordering invariant
    pub fn is_ordered(&self) -> bool {
        self.hst < self.nmin && self.nmin <= self.nmax && self.nmax < self.spt && self.spt < self.hpt
    }

    /// Parameter name/value pairs in firmware order
    pub fn as_params(&self) -> [(&'static str, i32); 5] {
        [
            ("HST", self.hst),
            ("NMIN", self.nmin),
            ("NMAX", self.nmax),
            ("SPT", self.spt),
            ("HPT", self.hpt),
        ]
    }
}

/// Neutral band the soft thresholds are separated from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NeutralBand {
    pub low: i32,
    pub high: i32,
}

/// Fallback averages for actions that were never recorded
///
/// Defaults are the firmware factory thresholds with neutral at the sensor
/// centre, so partial calibration degrades to the factory layout instead of
/// collapsing toward zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DefaultThresholds {
    pub neutral: i32,
    pub soft_sip: i32,
    pub hard_sip: i32,
    pub soft_puff: i32,
    pub hard_puff: i32,
}

impl DefaultThresholds {
    /// Fallback value for one action
    pub fn for_action(&self, action: Action) -> i32 {
        match action {
            Action::Neutral => self.neutral,
            Action::SoftSip => self.soft_sip,
            Action::HardSip => self.hard_sip,
            Action::SoftPuff => self.soft_puff,
            Action::HardPuff => self.hard_puff,
        }
    }
}

impl Default for DefaultThresholds {
    fn default() -> Self {
        Self {
            neutral: 0,
            soft_sip: -100,
            hard_sip: -200,
            soft_puff: 100,
            hard_puff: 200,
        }
    }
}

/// Separation constants used by the derivation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DerivationRules {
    /// Half width of the neutral band around the neutral average
    pub neutral_half_width: i32,
    /// Minimum gap between the neutral band and the soft thresholds
    pub soft_gap: i32,
    /// Minimum gap between soft and hard thresholds
    pub hard_gap: i32,
    /// Share of samples trimmed from each end before averaging
    pub trim_fraction: f64,
}

impl DerivationRules {
    /// Clamp values that would break the ordering invariant
    ///
    /// Gaps below 1 would allow equal thresholds and a negative half width
    /// would invert the band.
    pub fn normalized(self) -> Self {
        Self {
            neutral_half_width: self.neutral_half_width.max(0),
            soft_gap: self.soft_gap.max(1),
            hard_gap: self.hard_gap.max(1),
            trim_fraction: if self.trim_fraction.is_finite() {
                self.trim_fraction.clamp(0.0, 0.5)
            } else {
                DEFAULT_TRIM_FRACTION
            },
        }
    }
}

impl Default for DerivationRules {
    fn default() -> Self {
        Self {
            neutral_half_width: 15,
            soft_gap: 5,
            hard_gap: 10,
            trim_fraction: DEFAULT_TRIM_FRACTION,
        }
    }
}

/// Per-action averages fed into the derivation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionAverages {
    pub neutral: i32,
    pub soft_sip: i32,
    pub hard_sip: i32,
    pub soft_puff: i32,
    pub hard_puff: i32,
}

impl ActionAverages {
    /// Build from a lookup, e.g. recorded stats with a defaults fallback
    pub fn from_fn(mut average_for: impl FnMut(Action) -> i32) -> Self {
        Self {
            neutral: average_for(Action::Neutral),
            soft_sip: average_for(Action::SoftSip),
            hard_sip: average_for(Action::HardSip),
            soft_puff: average_for(Action::SoftPuff),
            hard_puff: average_for(Action::HardPuff),
        }
    }
}

/// Derive ordered thresholds from per-action averages
///
/// 1. neutral band = neutral ∓ half width
/// 2. soft sip = min(measured, band.low - soft gap)
/// 3. hard sip = min(measured, soft sip - hard gap)
/// 4. soft puff = max(measured, band.high + soft gap)
/// 5. hard puff = max(measured, soft puff + hard gap)
///
/// The ordering holds for any averages whose magnitude stays well inside
/// `i32` (saturating arithmetic is used at the extremes).
pub fn derive_thresholds(
    averages: &ActionAverages,
    rules: &DerivationRules,
) -> (ThresholdSet, NeutralBand) {
    let rules = rules.normalized();

    let band = NeutralBand {
        low: averages.neutral.saturating_sub(rules.neutral_half_width),
        high: averages.neutral.saturating_add(rules.neutral_half_width),
    };

    let sst = averages.soft_sip.min(band.low.saturating_sub(rules.soft_gap));
    let hst = averages.hard_sip.min(sst.saturating_sub(rules.hard_gap));
    let spt = averages.soft_puff.max(band.high.saturating_add(rules.soft_gap));
    let hpt = averages.hard_puff.max(spt.saturating_add(rules.hard_gap));

    let thresholds = ThresholdSet {
        hst,
        nmin: sst,
        nmax: band.high,
        spt,
        hpt,
    };

    (thresholds, band)
}
