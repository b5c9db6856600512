// CommandTable - Dispatch map from command name to handler

use crate::clock::Clock;
use crate::command::commands;
use crate::command::trait_def::{CommandRequest, Handler, Reply};
use crate::sequencer::{SequencerError, SequencerResult};
use crate::stage::Stage;
use std::collections::HashMap;

/// Fixed table of every command the stage understands
///
/// Names are stable; lookup is exact after trimming and lowercasing.
pub struct CommandTable<C: Clock> {
    handlers: HashMap<&'static str, Handler<C>>,
}

impl<C: Clock> CommandTable<C> {
    pub fn new() -> Self {
        let entries: [(&'static str, Handler<C>); 13] = [
            ("play", commands::play),
            ("set_notes", commands::set_notes),
            ("set_timing", commands::set_timing),
            ("set_instrument", commands::set_instrument),
            ("stop", commands::stop),
            ("reset", commands::reset),
            ("view_errors", commands::view_errors),
            ("toggle_loop", commands::toggle_loop),
            ("lock_loop", commands::lock_loop),
            ("link", commands::link),
            ("unlink", commands::unlink),
            ("autolink", commands::autolink),
            ("pair", commands::pair),
        ];
        Self {
            handlers: entries.into_iter().collect(),
        }
    }

    /// Run one request against the stage
    pub fn dispatch(
        &self,
        stage: &mut Stage<C>,
        request: &CommandRequest,
    ) -> SequencerResult<Reply> {
        let name = request.command.trim().to_ascii_lowercase();
        let handler = self
            .handlers
            .get(name.as_str())
            .ok_or_else(|| SequencerError::UnknownCommand(request.command.clone()))?;

        let result = handler(stage, request.device, &request.payload);
        if let Err(e) = &result {
            log::debug!(target: "stage", "{} on device {} failed: {}", name, request.device, e);
        }
        result
    }

    /// Registered command names, sorted
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.handlers.keys().copied().collect();
        names.sort_unstable();
        names
    }
}

impl<C: Clock> Default for CommandTable<C> {
    fn default() -> Self {
        Self::new()
    }
}
