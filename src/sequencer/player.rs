// Sequencer Player - Per-device playback state machine
// Idle -> Playing -> (Stopping ->) Idle, driven one tick at a time by the clock

use crate::DeviceId;
use crate::clock::{Clock, TimerId};
use crate::instrument::{Instrument, InstrumentCatalog};
use crate::messaging::NotificationKind;
use crate::sequencer::guard::ensure_reconfigurable;
use crate::sequencer::parser::{ErrorLog, ParserLimits, parse_with_limits};
use crate::sequencer::pattern::Schedule;
use crate::sequencer::timeline::{Timing, TimingBounds};
use crate::sequencer::transport::{LoopMode, PlaybackState};
use crate::sequencer::{InvalidTransition, SequencerError, SequencerResult};

/// Where playback is inside the schedule
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Cursor {
    /// Next token to dispatch
    index: usize,
    /// Ticks the current token still occupies after its first one
    hold: u32,
    /// Completed passes (only grows while looping)
    pass: u32,
}

/// Read-only copy of a device's state, for display and comparison
#[derive(Debug, Clone, PartialEq)]
pub struct SequencerState {
    pub state: PlaybackState,
    pub notes_text: String,
    pub schedule: Schedule,
    pub timing: Timing,
    pub loop_mode: LoopMode,
    pub instrument: Option<Instrument>,
    pub error_log: ErrorLog,
    pub stop_requested: bool,
    pub anchored: bool,
}

/// One device's sequencer
///
/// Owns its composition and its playback timer. Link membership lives in
/// the ensemble linker, not here.
pub struct Sequencer {
    id: DeviceId,
    state: PlaybackState,
    notes_text: String,
    schedule: Schedule,
    error_log: ErrorLog,
    timing: Timing,
    bounds: TimingBounds,
    limits: ParserLimits,
    loop_mode: LoopMode,
    instrument: Option<Instrument>,
    stop_requested: bool,
    anchored: bool,
    cursor: Cursor,
    timer: Option<TimerId>,
    /// Effects produced since the last drain
    pending: Vec<NotificationKind>,
}

impl Sequencer {
    /// Create an idle, anchored sequencer with no notes
    pub fn new(
        id: DeviceId,
        timing: Timing,
        bounds: TimingBounds,
        limits: ParserLimits,
        instrument: Option<Instrument>,
    ) -> Self {
        Self {
            id,
            state: PlaybackState::Idle,
            notes_text: String::new(),
            schedule: Schedule::new(),
            error_log: ErrorLog::new(),
            timing,
            bounds,
            limits,
            loop_mode: LoopMode::Off,
            instrument,
            stop_requested: false,
            anchored: true,
            cursor: Cursor::default(),
            timer: None,
            pending: Vec::new(),
        }
    }

    pub fn id(&self) -> DeviceId {
        self.id
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    pub fn error_log(&self) -> &ErrorLog {
        &self.error_log
    }

    pub fn timing(&self) -> Timing {
        self.timing
    }

    pub fn loop_mode(&self) -> LoopMode {
        self.loop_mode
    }

    pub fn instrument(&self) -> Option<&Instrument> {
        self.instrument.as_ref()
    }

    pub fn is_anchored(&self) -> bool {
        self.anchored
    }

    pub fn timer(&self) -> Option<TimerId> {
        self.timer
    }

    pub fn snapshot(&self) -> SequencerState {
        SequencerState {
            state: self.state,
            notes_text: self.notes_text.clone(),
            schedule: self.schedule.clone(),
            timing: self.timing,
            loop_mode: self.loop_mode,
            instrument: self.instrument.clone(),
            error_log: self.error_log.clone(),
            stop_requested: self.stop_requested,
            anchored: self.anchored,
        }
    }

    /// Take the effects produced since the last call
    pub fn drain_events(&mut self) -> Vec<NotificationKind> {
        std::mem::take(&mut self.pending)
    }

    /// Session guard check for a reconfiguring operation
    pub fn ensure_reconfigurable(&self, operation: &'static str) -> SequencerResult<()> {
        ensure_reconfigurable(self.state, operation)?;
        Ok(())
    }

    /// Re-parse the note text, replacing schedule and error log wholesale
    pub fn set_notes(&mut self, text: &str) -> SequencerResult<()> {
        self.ensure_reconfigurable("set notes")?;

        let (schedule, errors) = parse_with_limits(text, &self.limits);
        self.notes_text = text.to_string();
        self.schedule = schedule;
        self.error_log = errors;
        self.pending.push(NotificationKind::ErrorsChanged {
            count: self.error_log.len(),
        });
        Ok(())
    }

    /// Replace the tick period. Out-of-range values leave the old one in place.
    pub fn set_timing(&mut self, seconds: f64) -> SequencerResult<()> {
        self.ensure_reconfigurable("set timing")?;
        self.timing = self.bounds.check(seconds)?;
        Ok(())
    }

    /// Same as [`Sequencer::set_timing`], from operator text
    pub fn set_timing_text(&mut self, text: &str) -> SequencerResult<()> {
        self.ensure_reconfigurable("set timing")?;
        self.timing = self.bounds.parse(text)?;
        Ok(())
    }

    pub fn set_instrument(
        &mut self,
        name: &str,
        catalog: &InstrumentCatalog,
    ) -> SequencerResult<()> {
        self.ensure_reconfigurable("set instrument")?;
        self.instrument = Some(catalog.resolve(name)?);
        Ok(())
    }

    /// Off <-> On, only while idle and never once locked
    pub fn toggle_loop(&mut self) -> SequencerResult<LoopMode> {
        self.ensure_reconfigurable("toggle loop")?;
        self.loop_mode = self.loop_mode.toggled()?;
        self.pending.push(NotificationKind::LoopModeChanged(self.loop_mode));
        Ok(self.loop_mode)
    }

    /// Permanently disable looping. Accepted in any state.
    pub fn lock_loop(&mut self) {
        if self.loop_mode != LoopMode::Locked {
            self.loop_mode = self.loop_mode.locked();
            self.pending.push(NotificationKind::LoopModeChanged(self.loop_mode));
        }
    }

    pub(crate) fn set_anchored(&mut self, anchored: bool) {
        self.anchored = anchored;
    }

    /// Validate and start playback with the first tick at `start_at`
    pub fn ready(&mut self, clock: &mut dyn Clock, start_at: f64) -> SequencerResult<()> {
        if self.state.is_busy() {
            return Err(InvalidTransition::Busy("play").into());
        }
        if !self.anchored {
            return Err(SequencerError::NotPlayable("device is not anchored".into()));
        }
        if self.schedule.is_empty() {
            return Err(SequencerError::NotPlayable("no notes to play".into()));
        }
        if self.instrument.is_none() {
            return Err(SequencerError::NotPlayable("no instrument selected".into()));
        }

        self.cursor = Cursor::default();
        self.stop_requested = false;
        self.timer = Some(clock.schedule_recurring(self.id, start_at, self.timing.seconds()));
        self.transition(PlaybackState::Playing);
        Ok(())
    }

    /// Ask playback to end at the next tick boundary. No-op unless playing.
    pub fn request_stop(&mut self) {
        if self.state == PlaybackState::Playing {
            self.stop_requested = true;
        }
    }

    /// Handle one timer fire
    ///
    /// Fires from a timer this device no longer owns are ignored.
    pub fn on_tick(&mut self, clock: &mut dyn Clock, timer: TimerId) {
        if self.state != PlaybackState::Playing || self.timer != Some(timer) {
            return;
        }

        if self.stop_requested {
            self.stop_requested = false;
            self.transition(PlaybackState::Stopping);
            self.finish(clock);
            return;
        }

        if self.cursor.hold > 0 {
            self.cursor.hold -= 1;
        } else {
            let Some(token) = self.schedule.get(self.cursor.index).copied() else {
                self.finish(clock);
                return;
            };

            if let (Some(pitch), Some(instrument)) = (token.sounding_pitch(), &self.instrument) {
                self.pending.push(NotificationKind::NoteDispatched {
                    instrument: instrument.clone(),
                    pitch,
                });
            }
            self.cursor.index += 1;
            self.cursor.hold = token.duration_ticks() - 1;
        }

        if self.cursor.hold == 0 && self.cursor.index >= self.schedule.len() {
            self.end_of_pass(clock);
        }
    }

    /// Cancel playback. A hard reset also forgets the composition.
    ///
    /// Accepted in any state; resetting an idle device is harmless.
    pub fn reset(&mut self, clock: &mut dyn Clock, hard: bool) {
        self.cancel_timer(clock);
        self.cursor = Cursor::default();
        self.stop_requested = false;
        if self.state != PlaybackState::Idle {
            self.transition(PlaybackState::Idle);
        }

        if hard {
            self.notes_text.clear();
            self.schedule = Schedule::new();
            self.error_log = ErrorLog::new();
            self.pending.push(NotificationKind::ErrorsChanged { count: 0 });
        }
    }

    fn end_of_pass(&mut self, clock: &mut dyn Clock) {
        if self.loop_mode.repeats() {
            self.cursor.index = 0;
            self.cursor.pass += 1;
            self.pending.push(NotificationKind::Looped {
                pass: self.cursor.pass,
            });
        } else {
            self.finish(clock);
        }
    }

    fn finish(&mut self, clock: &mut dyn Clock) {
        self.cancel_timer(clock);
        self.cursor = Cursor::default();
        self.transition(PlaybackState::Idle);
    }

    fn cancel_timer(&mut self, clock: &mut dyn Clock) {
        if let Some(timer) = self.timer.take() {
            clock.cancel(timer);
        }
    }

    fn transition(&mut self, state: PlaybackState) {
        log::debug!(target: "sequencer", "device {}: {} -> {}", self.id, self.state, state);
        self.state = state;
        self.pending.push(NotificationKind::StateChanged(state));
    }
}
