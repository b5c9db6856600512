// Pianola - Text-notated sequencers driving shared instruments

pub mod clock;
pub mod command;
pub mod config;
pub mod ensemble;
pub mod instrument;
pub mod messaging;
pub mod sequencer;
pub mod stage;

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identity of a sequencer device, allocated by the [`Stage`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceId(u32);

impl DeviceId {
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// Re-export commonly used types for convenience
pub use clock::{Clock, TimerId, VirtualClock};
pub use command::{CommandRequest, CommandTable, Reply};
pub use config::{Config, ConfigError};
pub use ensemble::Linker;
pub use instrument::{Instrument, InstrumentCatalog};
pub use messaging::{
    Notification, NotificationConsumer, NotificationKind, create_notification_channel,
};
pub use sequencer::{
    ErrorLog, InvalidTransition, LoopMode, NoteToken, ParseError, Pitch, PlaybackState, Schedule,
    Sequencer, SequencerError, SequencerResult, Timing,
};
pub use stage::{DeviceSnapshot, Stage};
