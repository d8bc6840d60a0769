//! Classification of coverage percentages into quality bands.
//!
//! Every rendered page goes through the same [`Thresholds`] value, so the
//! band boundaries are defined in one place.

use std::fmt;

use serde::Serialize;

use crate::error::{CovtreeError, Result};

/// Upper bound (exclusive) of the `Lo` band.
pub const LOW_UPPER_BOUND: u32 = 35;

/// Lower bound (inclusive) of the `Hi` band.
pub const HIGH_LOWER_BOUND: u32 = 70;

/// One of three quality levels derived from a percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Level {
    Lo,
    Med,
    Hi,
}

impl Level {
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Lo => "Lo",
            Level::Med => "Med",
            Level::Hi => "Hi",
        }
    }

    /// Display color used by the page templates.
    pub fn color(&self) -> &'static str {
        match self {
            Level::Lo => "scarlet_red",
            Level::Med => "butter",
            Level::Hi => "chameleon",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Band boundaries, as whole percentages.
///
/// Bands are closed-open on the floored percentage:
/// `[0, low_upper_bound)` is `Lo`, `[low_upper_bound, high_lower_bound)` is
/// `Med` and `[high_lower_bound, 100]` is `Hi`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Thresholds {
    low_upper_bound: u32,
    high_lower_bound: u32,
}

impl Thresholds {
    pub fn new(low_upper_bound: u32, high_lower_bound: u32) -> Result<Self> {
        if low_upper_bound > high_lower_bound || high_lower_bound > 100 {
            return Err(CovtreeError::Other(format!(
                "Invalid thresholds: low upper bound {low_upper_bound} must not exceed \
                 high lower bound {high_lower_bound}, which must not exceed 100"
            )));
        }
        Ok(Self {
            low_upper_bound,
            high_lower_bound,
        })
    }

    pub fn low_upper_bound(&self) -> u32 {
        self.low_upper_bound
    }

    pub fn high_lower_bound(&self) -> u32 {
        self.high_lower_bound
    }

    /// Classify a percentage. Only the integer part counts, so `34.9` is
    /// still `Lo` under the default bounds.
    #[must_use]
    pub fn level(&self, percent: f64) -> Level {
        let floor = percent.floor();
        if floor < f64::from(self.low_upper_bound) {
            Level::Lo
        } else if floor < f64::from(self.high_lower_bound) {
            Level::Med
        } else {
            Level::Hi
        }
    }

    /// Color and level pair for a percentage.
    #[must_use]
    pub fn color_level(&self, percent: f64) -> (&'static str, Level) {
        let level = self.level(percent);
        (level.color(), level)
    }
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            low_upper_bound: LOW_UPPER_BOUND,
            high_lower_bound: HIGH_LOWER_BOUND,
        }
    }
}
