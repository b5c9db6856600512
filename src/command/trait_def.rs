// Request, reply and handler signature

use crate::DeviceId;
use crate::sequencer::SequencerResult;
use crate::stage::Stage;
use serde::Deserialize;

/// One command from the signal bus
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CommandRequest {
    pub device: DeviceId,
    pub command: String,
    #[serde(default)]
    pub payload: String,
}

impl CommandRequest {
    pub fn new(device: DeviceId, command: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            device,
            command: command.into(),
            payload: payload.into(),
        }
    }
}

/// Successful outcome, with an optional message for the operator
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reply {
    pub message: Option<String>,
}

impl Reply {
    pub fn ok() -> Self {
        Self::default()
    }

    pub fn message(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
        }
    }
}

/// A command handler: target device and raw payload in, reply or error out
///
/// Errors leave the stage exactly as it was.
pub type Handler<C> = fn(&mut Stage<C>, DeviceId, &str) -> SequencerResult<Reply>;
