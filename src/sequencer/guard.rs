// Session guard - Single exclusivity check between playback and reconfiguration
//
// Every mutating entry point of a device (notes, timing, instrument, links,
// loop toggle) goes through `ensure_reconfigurable` before touching state.
// Stop and reset never do.

use crate::sequencer::InvalidTransition;
use crate::sequencer::transport::PlaybackState;

/// Refuse `operation` while the device is playing or stopping
pub fn ensure_reconfigurable(
    state: PlaybackState,
    operation: &'static str,
) -> Result<(), InvalidTransition> {
    if state.is_busy() {
        Err(InvalidTransition::Busy(operation))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_idle_accepts_reconfiguration() {
        assert!(ensure_reconfigurable(PlaybackState::Idle, "set notes").is_ok());
    }

    #[test]
    fn test_busy_rejects_reconfiguration() {
        for state in [PlaybackState::Playing, PlaybackState::Stopping] {
            assert_eq!(
                ensure_reconfigurable(state, "set timing"),
                Err(InvalidTransition::Busy("set timing"))
            );
        }
    }

    #[test]
    fn test_busy_error_message() {
        let err = ensure_reconfigurable(PlaybackState::Playing, "link").unwrap_err();
        assert_eq!(err.to_string(), "cannot link while playing");
    }
}
