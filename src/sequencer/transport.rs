// Transport - Playback state and looping policy

use crate::sequencer::InvalidTransition;
use std::fmt;

/// Playback state of one device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    #[default]
    Idle,
    Playing,
    /// Entered on the tick that observes a stop request, left on the same tick
    Stopping,
}

impl PlaybackState {
    /// Check if the device is busy (reconfiguration is refused)
    pub fn is_busy(&self) -> bool {
        matches!(self, PlaybackState::Playing | PlaybackState::Stopping)
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, PlaybackState::Idle)
    }
}

impl fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PlaybackState::Idle => "idle",
            PlaybackState::Playing => "playing",
            PlaybackState::Stopping => "stopping",
        };
        f.write_str(name)
    }
}

/// Looping policy
///
/// `Locked` is terminal: there is no edge out of it, so no sequence of
/// calls can bring looping back once the loop has been locked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoopMode {
    #[default]
    Off,
    On,
    Locked,
}

impl LoopMode {
    /// Off <-> On. Fails once locked.
    pub fn toggled(self) -> Result<LoopMode, InvalidTransition> {
        match self {
            LoopMode::Off => Ok(LoopMode::On),
            LoopMode::On => Ok(LoopMode::Off),
            LoopMode::Locked => Err(InvalidTransition::LoopLocked),
        }
    }

    /// The irreversible edge. Locking twice stays locked.
    pub fn locked(self) -> LoopMode {
        LoopMode::Locked
    }

    /// Whether a finished pass wraps back to the first token
    pub fn repeats(&self) -> bool {
        matches!(self, LoopMode::On)
    }
}

impl fmt::Display for LoopMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LoopMode::Off => "off",
            LoopMode::On => "on",
            LoopMode::Locked => "locked",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_busy_states() {
        assert!(!PlaybackState::Idle.is_busy());
        assert!(PlaybackState::Playing.is_busy());
        assert!(PlaybackState::Stopping.is_busy());
    }

    #[test]
    fn test_loop_toggle_cycle() {
        let mode = LoopMode::default();
        assert_eq!(mode, LoopMode::Off);

        let mode = mode.toggled().unwrap();
        assert_eq!(mode, LoopMode::On);
        assert!(mode.repeats());

        let mode = mode.toggled().unwrap();
        assert_eq!(mode, LoopMode::Off);
    }

    #[test]
    fn test_locked_is_terminal() {
        for start in [LoopMode::Off, LoopMode::On] {
            let mode = start.locked();
            assert_eq!(mode.toggled(), Err(InvalidTransition::LoopLocked));
            assert_eq!(mode.locked(), LoopMode::Locked);
            assert!(!mode.repeats());
        }
    }
}
