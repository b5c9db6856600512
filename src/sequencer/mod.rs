// Sequencer module
// Notation parsing, schedules, tick timing and the per-device playback state machine

pub mod guard;
pub mod note;
pub mod parser;
pub mod pattern;
pub mod player;
pub mod timeline;
pub mod transport;

pub use note::{NoteKind, NoteToken, Pitch, PitchClass};
pub use parser::{ErrorLog, ParseError, ParserLimits, parse, parse_with_limits};
pub use pattern::Schedule;
pub use player::{Sequencer, SequencerState};
pub use timeline::{MAX_TIMING, MIN_TIMING, Timing, TimingBounds};
pub use transport::{LoopMode, PlaybackState};

use crate::DeviceId;
use thiserror::Error;

/// Refused state-machine transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InvalidTransition {
    #[error("cannot {0} while playing")]
    Busy(&'static str),

    #[error("loop mode is permanently locked")]
    LoopLocked,
}

/// Sequencer errors
///
/// Every variant is reported synchronously to the caller and leaves the
/// stored state untouched. Per-symbol notation problems are not here: they
/// are collected in an [`ErrorLog`] instead.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SequencerError {
    #[error("not playable: {0}")]
    NotPlayable(String),

    #[error("timing {value} is out of range [{min}, {max}]")]
    OutOfRange { value: f64, min: f64, max: f64 },

    #[error("malformed timing value '{0}'")]
    MalformedTiming(String),

    #[error("invalid instrument '{0}'")]
    InvalidInstrument(String),

    #[error("invalid transition: {0}")]
    InvalidTransition(#[from] InvalidTransition),

    #[error("link rejected: {0}")]
    LinkRejected(String),

    #[error("unknown device {0}")]
    UnknownDevice(DeviceId),

    #[error("unknown command '{0}'")]
    UnknownCommand(String),

    #[error("malformed payload for '{command}': {reason}")]
    MalformedPayload { command: String, reason: String },
}

pub type SequencerResult<T> = Result<T, SequencerError>;
