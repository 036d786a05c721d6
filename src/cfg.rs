use hifitime::Duration;
use serde::{Deserialize, Serialize};

use crate::epoch::epoch_tolerance;

fn default_tolerance() -> Duration {
    epoch_tolerance()
}

/// [Config] tunes validation and sampling.
/// It applies to a whole message and all its segments.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Epochs closer than this are considered identical:
    /// exact state lookup and range inclusion.
    #[serde(default = "default_tolerance")]
    pub epoch_tolerance: Duration,
    /// Gaps or overlaps between consecutive segments
    /// larger than this are reported as warnings.
    #[serde(default = "default_tolerance")]
    pub gap_tolerance: Duration,
    /// Allow sampling outside the useable time range.
    /// Accuracy quickly degrades outside the tabulated states.
    #[serde(default)]
    pub extrapolation: bool,
    /// Covariance lookup only succeeds on exact epochs
    /// (nearest covariance otherwise).
    #[serde(default)]
    pub strict_covariance: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            epoch_tolerance: default_tolerance(),
            gap_tolerance: default_tolerance(),
            extrapolation: false,
            strict_covariance: false,
        }
    }
}

impl Config {
    /// Copies and returns [Config] with updated epoch tolerance
    pub fn with_epoch_tolerance(&self, tolerance: Duration) -> Self {
        let mut s = *self;
        s.epoch_tolerance = tolerance.abs();
        s
    }
    /// Copies and returns [Config] with updated gap tolerance
    pub fn with_gap_tolerance(&self, tolerance: Duration) -> Self {
        let mut s = *self;
        s.gap_tolerance = tolerance.abs();
        s
    }
    /// Copies and returns [Config] with extrapolation enabled or disabled
    pub fn with_extrapolation(&self, extrapolation: bool) -> Self {
        let mut s = *self;
        s.extrapolation = extrapolation;
        s
    }
    /// Copies and returns [Config] with strict covariance lookup
    pub fn with_strict_covariance(&self, strict: bool) -> Self {
        let mut s = *self;
        s.strict_covariance = strict;
        s
    }
}
