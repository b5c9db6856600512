// Configuration - Timing bounds, parser limits and the instrument allow-list
//
// Stored as RON. `Config::load` falls back to defaults when the user file is
// missing or malformed; `Config::from_path` reports the problem instead.

use crate::instrument::InstrumentCatalog;
use crate::sequencer::timeline::{DEFAULT_TIMING, Timing};
use crate::sequencer::{ParserLimits, TimingBounds};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("RON error: {0}")]
    Ron(#[from] ron::error::SpannedError),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Runtime configuration of a stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Accepted tick periods, inclusive
    pub timing: TimingBounds,
    /// Tick period of new devices
    pub default_timing: f64,
    pub limits: ParserLimits,
    /// Instrument allow-list
    pub instruments: Vec<String>,
    pub default_instrument: String,
    /// Cap on links per device, `None` for no cap
    pub max_peers: Option<usize>,
    /// Notifications buffered before new ones are dropped
    pub notification_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            timing: TimingBounds::default(),
            default_timing: DEFAULT_TIMING,
            limits: ParserLimits::default(),
            instruments: ["piano", "harpsichord", "organ", "xylophone", "synth"]
                .into_iter()
                .map(String::from)
                .collect(),
            default_instrument: "piano".to_string(),
            max_peers: None,
            notification_capacity: 1024,
        }
    }
}

impl Config {
    /// Load the user configuration, or defaults
    pub fn load() -> Self {
        let Some(path) = user_config_path() else {
            return Self::default();
        };
        if !path.exists() {
            return Self::default();
        }
        match Self::from_path(&path) {
            Ok(config) => {
                log::info!(target: "config", "loaded {}", path.display());
                config
            }
            Err(e) => {
                log::warn!(target: "config", "ignoring config {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Read and validate a RON file
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_ron_str(&contents)
    }

    pub fn from_ron_str(contents: &str) -> Result<Self, ConfigError> {
        let config: Config = ron::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_ron_string(&self) -> Result<String, ConfigError> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| ConfigError::Invalid(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let TimingBounds { min, max } = self.timing;
        if !(min.is_finite() && max.is_finite()) || min <= 0.0 || min > max {
            return Err(ConfigError::Invalid(format!(
                "timing bounds [{}, {}] must be positive and ordered",
                min, max
            )));
        }
        if !self.timing.contains(self.default_timing) {
            return Err(ConfigError::Invalid(format!(
                "default timing {} is outside [{}, {}]",
                self.default_timing, min, max
            )));
        }
        if self.limits.max_tokens == 0 || self.limits.max_ticks == 0 {
            return Err(ConfigError::Invalid(
                "parser limits must be positive".to_string(),
            ));
        }
        if self.notification_capacity == 0 {
            return Err(ConfigError::Invalid(
                "notification capacity must be positive".to_string(),
            ));
        }
        self.catalog()?;
        Ok(())
    }

    /// Instrument catalog described by this configuration
    pub fn catalog(&self) -> Result<InstrumentCatalog, ConfigError> {
        InstrumentCatalog::new(self.instruments.iter().cloned(), &self.default_instrument)
            .ok_or_else(|| {
                ConfigError::Invalid(format!(
                    "default instrument '{}' is not in the instrument list",
                    self.default_instrument
                ))
            })
    }

    /// Default tick period, checked against the bounds
    pub fn initial_timing(&self) -> Result<Timing, ConfigError> {
        self.timing
            .check(self.default_timing)
            .map_err(|e| ConfigError::Invalid(e.to_string()))
    }
}

/// `<config dir>/pianola/config.ron`
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("pianola").join("config.ron"))
}
