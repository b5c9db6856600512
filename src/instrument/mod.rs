// Instrument binding - Allow-listed instrument names
// The name resolves to a sound asset outside this crate; here it is only validated and stored

use crate::sequencer::{SequencerError, SequencerResult};
use std::fmt;

/// A validated instrument name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Instrument(String);

impl Instrument {
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Instrument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The fixed set of instruments a device may select
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstrumentCatalog {
    allowed: Vec<String>,
    default: String,
}

impl InstrumentCatalog {
    /// Build a catalog. Names are matched case-insensitively.
    ///
    /// Returns `None` if the list is empty or does not contain the default.
    pub fn new<I, S>(allowed: I, default: &str) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let allowed: Vec<String> = allowed
            .into_iter()
            .map(|s| s.into().trim().to_ascii_lowercase())
            .filter(|s| !s.is_empty())
            .collect();
        let default = default.trim().to_ascii_lowercase();

        allowed
            .contains(&default)
            .then_some(Self { allowed, default })
    }

    /// Validate a name against the allow-list
    pub fn resolve(&self, name: &str) -> SequencerResult<Instrument> {
        let wanted = name.trim().to_ascii_lowercase();
        if self.allowed.contains(&wanted) {
            Ok(Instrument(wanted))
        } else {
            Err(SequencerError::InvalidInstrument(name.to_string()))
        }
    }

    /// Instrument used by devices without a selection UI
    pub fn default_instrument(&self) -> Instrument {
        Instrument(self.default.clone())
    }

    pub fn names(&self) -> &[String] {
        &self.allowed
    }
}
