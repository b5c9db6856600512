// Notifications - What a device did, stamped with clock time

use crate::DeviceId;
use crate::instrument::Instrument;
use crate::sequencer::{LoopMode, Pitch, PlaybackState};
use std::fmt;

/// Severity of a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Warning,
}

/// What happened
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationKind {
    /// A note was sent to the instrument
    NoteDispatched { instrument: Instrument, pitch: Pitch },
    StateChanged(PlaybackState),
    LoopModeChanged(LoopMode),
    /// The schedule wrapped; `pass` counts completed passes
    Looped { pass: u32 },
    /// The error log was replaced
    ErrorsChanged { count: usize },
    Linked { peer: DeviceId },
    Unlinked { peer: DeviceId },
}

/// Notification with clock timestamp and device
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub device: DeviceId,
    /// Clock time in seconds
    pub at: f64,
    pub kind: NotificationKind,
}

impl Notification {
    pub fn new(device: DeviceId, at: f64, kind: NotificationKind) -> Self {
        Self { device, at, kind }
    }

    pub fn level(&self) -> NotificationLevel {
        match self.kind {
            NotificationKind::ErrorsChanged { count } if count > 0 => NotificationLevel::Warning,
            _ => NotificationLevel::Info,
        }
    }

    pub fn is_dispatch(&self) -> bool {
        matches!(self.kind, NotificationKind::NoteDispatched { .. })
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:>8.3}] device {}: ", self.at, self.device)?;
        match &self.kind {
            NotificationKind::NoteDispatched { instrument, pitch } => {
                write!(f, "{} plays {}", instrument, pitch)
            }
            NotificationKind::StateChanged(state) => write!(f, "now {}", state),
            NotificationKind::LoopModeChanged(mode) => write!(f, "loop {}", mode),
            NotificationKind::Looped { pass } => write!(f, "looped (pass {})", pass),
            NotificationKind::ErrorsChanged { count } => write!(f, "{} notation error(s)", count),
            NotificationKind::Linked { peer } => write!(f, "linked to {}", peer),
            NotificationKind::Unlinked { peer } => write!(f, "unlinked from {}", peer),
        }
    }
}
