// Trimmed statistics over a recorded sample window
//
// A human-performed gesture ramps in and out, so the extremes of the sorted
// window are dropped before averaging. Min/max still report the raw window
// so outliers stay visible.

use serde::{Deserialize, Serialize};

/// Default share of samples dropped from each end before averaging
pub const DEFAULT_TRIM_FRACTION: f64 = 0.1;

/// Statistics for one action's sample window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionStats {
    /// Trimmed mean (floor division)
    pub average: i32,
    /// Minimum over the untrimmed window
    pub min: i32,
    /// Maximum over the untrimmed window
    pub max: i32,
    /// Number of samples in the window
    pub count: usize,
}

impl ActionStats {
    /// Stats reported for an action that was never recorded
    pub fn zero() -> Self {
        Self {
            average: 0,
            min: 0,
            max: 0,
            count: 0,
        }
    }

    /// Compute trimmed statistics from a sample window
    ///
    /// Sorts a copy of `samples`, drops `trim_count(len, trim_fraction)`
    /// values from each end and floors the mean of the rest. Falls back to
    /// the full window when trimming would leave nothing. An empty window
    /// yields [`ActionStats::zero`].
    pub fn compute(samples: &[i32], trim_fraction: f64) -> Self {
        if samples.is_empty() {
            return Self::zero();
        }

        let mut sorted = samples.to_vec();
        sorted.sort_unstable();

        let count = sorted.len();
        let trim = trim_count(count, trim_fraction);
        let stable = if count > 2 * trim {
            &sorted[trim..count - trim]
        } else {
            &sorted[..]
        };

        let sum: i64 = stable.iter().map(|&v| i64::from(v)).sum();
        let average = sum.div_euclid(stable.len() as i64) as i32;

        Self {
            average,
            min: sorted[0],
            max: sorted[count - 1],
            count,
        }
    }
}

/// Number of samples dropped from each end of a sorted window
///
/// Integer truncation of `count * fraction`. Negative or NaN fractions trim
/// nothing.
pub fn trim_count(count: usize, fraction: f64) -> usize {
    if fraction.is_nan() || fraction <= 0.0 {
        return 0;
    }
    (count as f64 * fraction) as usize
}
