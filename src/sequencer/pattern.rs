// Schedule - Ordered, restartable sequence of note tokens
// Produced wholesale by one parse, never edited in place

use crate::sequencer::note::NoteToken;
use crate::sequencer::timeline::Timing;

/// An ordered sequence of tokens produced by the notation parser
///
/// A schedule is immutable once built. Replacing the notes of a device
/// replaces the whole schedule.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schedule {
    tokens: Vec<NoteToken>,
    total_ticks: u64,
}

impl Schedule {
    /// Create an empty schedule
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_tokens(tokens: Vec<NoteToken>) -> Self {
        let total_ticks = tokens.iter().map(|t| t.duration_ticks() as u64).sum();
        Self {
            tokens,
            total_ticks,
        }
    }

    /// Get all tokens in playback order
    pub fn tokens(&self) -> &[NoteToken] {
        &self.tokens
    }

    pub fn get(&self, index: usize) -> Option<&NoteToken> {
        self.tokens.get(index)
    }

    /// Get the number of tokens
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Check if schedule is empty
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Length of one pass in ticks
    pub fn total_ticks(&self) -> u64 {
        self.total_ticks
    }

    /// Length of one pass in seconds at the given tick period
    pub fn duration(&self, timing: Timing) -> f64 {
        timing.tick_offset(self.total_ticks)
    }

    /// Number of tokens that actually sound (rests excluded)
    pub fn sounding_count(&self) -> usize {
        self.tokens.iter().filter(|t| !t.is_rest()).count()
    }
}
