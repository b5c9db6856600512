// Clock - Timer service consumed by the playback scheduler
//
// A playing device owns exactly one recurring timer. The host drives time
// forward and hands every due fire back to the timer's owner.

pub mod virtual_clock;

pub use virtual_clock::VirtualClock;

use crate::DeviceId;
use std::fmt;

/// Handle of one recurring timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerId(u64);

impl TimerId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TimerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "timer#{}", self.0)
    }
}

/// One delivery of a recurring timer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimerFire {
    pub timer: TimerId,
    pub owner: DeviceId,
    /// Clock time of this fire, in seconds
    pub at: f64,
}

/// Timer service
///
/// Times are seconds on the clock's own timeline. Implementations must
/// deliver fires in time order and never deliver a fire for a cancelled
/// timer.
pub trait Clock {
    /// Current clock time
    fn now(&self) -> f64;

    /// Request a timer firing at `first_fire`, then every `period` seconds
    fn schedule_recurring(&mut self, owner: DeviceId, first_fire: f64, period: f64) -> TimerId;

    /// Cancel a timer. Unknown or already cancelled handles are ignored.
    fn cancel(&mut self, timer: TimerId);

    /// Pop the earliest fire due at or before `until`, moving `now` to it
    fn next_due(&mut self, until: f64) -> Option<TimerFire>;

    /// Move `now` forward to `until` once every due fire has been delivered
    fn settle(&mut self, until: f64);

    /// Number of live timers
    fn active_timers(&self) -> usize;
}
