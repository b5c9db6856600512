// Timeline - Tick period and its accepted range
// One tick lasts `timing` seconds; every note lasts a whole number of ticks

use crate::sequencer::{SequencerError, SequencerResult};
use std::fmt;

/// Shortest accepted tick period, in seconds
pub const MIN_TIMING: f64 = 0.05;
/// Longest accepted tick period, in seconds
pub const MAX_TIMING: f64 = 5.0;
/// Tick period of a freshly built device
pub const DEFAULT_TIMING: f64 = 0.5;

/// Inclusive range of accepted tick periods
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct TimingBounds {
    pub min: f64,
    pub max: f64,
}

impl TimingBounds {
    pub fn contains(&self, seconds: f64) -> bool {
        seconds.is_finite() && (self.min..=self.max).contains(&seconds)
    }

    /// Validate a raw value against the bounds
    pub fn check(&self, seconds: f64) -> SequencerResult<Timing> {
        if self.contains(seconds) {
            Ok(Timing(seconds))
        } else {
            Err(SequencerError::OutOfRange {
                value: seconds,
                min: self.min,
                max: self.max,
            })
        }
    }

    /// Parse and validate an operator-supplied number, e.g. "0.25"
    pub fn parse(&self, text: &str) -> SequencerResult<Timing> {
        let seconds = text
            .trim()
            .parse::<f64>()
            .map_err(|_| SequencerError::MalformedTiming(text.to_string()))?;
        if seconds.is_nan() {
            return Err(SequencerError::MalformedTiming(text.to_string()));
        }
        self.check(seconds)
    }
}

impl Default for TimingBounds {
    fn default() -> Self {
        Self {
            min: MIN_TIMING,
            max: MAX_TIMING,
        }
    }
}

/// Tick period in seconds
///
/// Only obtainable through [`TimingBounds::check`], so a stored value is
/// always inside the bounds it was checked against.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Timing(f64);

impl Timing {
    pub fn seconds(&self) -> f64 {
        self.0
    }

    /// Start time of the given tick relative to the first one
    pub fn tick_offset(&self, tick: u64) -> f64 {
        tick as f64 * self.0
    }
}

impl Default for Timing {
    fn default() -> Self {
        Timing(DEFAULT_TIMING)
    }
}

impl fmt::Display for Timing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.3} s/tick", self.0)
    }
}
