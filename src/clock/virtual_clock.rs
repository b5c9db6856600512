// Virtual clock - Deterministic in-process timer service
// Fire times are computed from the start instant, so long runs do not drift

use super::{Clock, TimerFire, TimerId};
use crate::DeviceId;

/// Fire times are snapped to this many steps per second
const STEPS_PER_SECOND: f64 = 1e9;

#[derive(Debug, Clone)]
struct Timer {
    id: TimerId,
    owner: DeviceId,
    first_fire: f64,
    period: f64,
    fired: u64,
}

impl Timer {
    /// `first_fire + n * period`, snapped to the nanosecond grid
    fn next_fire(&self) -> f64 {
        let exact = self.first_fire + self.fired as f64 * self.period;
        (exact * STEPS_PER_SECOND).round() / STEPS_PER_SECOND
    }
}

/// Clock whose time only moves when the host says so
#[derive(Debug, Clone, Default)]
pub struct VirtualClock {
    now: f64,
    timers: Vec<Timer>,
    next_id: u64,
}

impl VirtualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clock starting at an arbitrary instant
    pub fn starting_at(now: f64) -> Self {
        Self {
            now,
            ..Self::default()
        }
    }

    /// Time of the next pending fire, if any timer is live
    pub fn next_fire_time(&self) -> Option<f64> {
        self.timers
            .iter()
            .map(Timer::next_fire)
            .min_by(|a, b| a.total_cmp(b))
    }
}

impl Clock for VirtualClock {
    fn now(&self) -> f64 {
        self.now
    }

    fn schedule_recurring(&mut self, owner: DeviceId, first_fire: f64, period: f64) -> TimerId {
        assert!(period > 0.0, "Timer period must be > 0");
        self.next_id += 1;
        let id = TimerId::new(self.next_id);
        self.timers.push(Timer {
            id,
            owner,
            first_fire: first_fire.max(self.now),
            period,
            fired: 0,
        });
        id
    }

    fn cancel(&mut self, timer: TimerId) {
        self.timers.retain(|t| t.id != timer);
    }

    fn next_due(&mut self, until: f64) -> Option<TimerFire> {
        // Earliest fire first; equal times go to the older timer
        let timer = self
            .timers
            .iter_mut()
            .filter(|t| t.next_fire() <= until)
            .min_by(|a, b| {
                a.next_fire()
                    .total_cmp(&b.next_fire())
                    .then(a.id.cmp(&b.id))
            })?;

        let at = timer.next_fire();
        timer.fired += 1;
        self.now = self.now.max(at);

        Some(TimerFire {
            timer: timer.id,
            owner: timer.owner,
            at,
        })
    }

    fn settle(&mut self, until: f64) {
        self.now = self.now.max(until);
    }

    fn active_timers(&self) -> usize {
        self.timers.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(clock: &mut VirtualClock, until: f64) -> Vec<(u64, f64)> {
        let mut fires = Vec::new();
        while let Some(fire) = clock.next_due(until) {
            fires.push((fire.timer.get(), fire.at));
        }
        clock.settle(until);
        fires
    }

    #[test]
    fn test_recurring_fires_without_drift() {
        let mut clock = VirtualClock::new();
        let id = clock.schedule_recurring(DeviceId::new(1), 0.0, 0.1);

        let fires = drain(&mut clock, 1.0);
        // 0.0, 0.1, ... 1.0 computed as multiples, never accumulated
        assert_eq!(fires.len(), 11);
        assert!(fires.iter().all(|(t, _)| *t == id.get()));
        assert_eq!(fires[10].1, 10.0 * 0.1);
        assert_eq!(clock.now(), 1.0);
    }

    #[test]
    fn test_fire_times_land_on_decimal_instants() {
        let mut clock = VirtualClock::new();
        clock.schedule_recurring(DeviceId::new(1), 0.0, 0.1);

        let fires = drain(&mut clock, 0.7);
        assert_eq!(fires.len(), 8);
        assert_eq!(fires[7].1, 0.7);
        assert_eq!(fires[3].1, 0.3);
    }

    #[test]
    fn test_fires_interleave_in_time_order() {
        let mut clock = VirtualClock::new();
        let a = clock.schedule_recurring(DeviceId::new(1), 0.0, 0.5);
        let b = clock.schedule_recurring(DeviceId::new(2), 0.0, 0.3);

        let fires = drain(&mut clock, 1.0);
        let order: Vec<u64> = fires.iter().map(|(t, _)| *t).collect();
        // t=0 (a, b), 0.3 b, 0.5 a, 0.6 b, 0.9 b, 1.0 a
        assert_eq!(
            order,
            vec![a.get(), b.get(), b.get(), a.get(), b.get(), b.get(), a.get()]
        );
    }

    #[test]
    fn test_cancelled_timer_never_fires() {
        let mut clock = VirtualClock::new();
        let id = clock.schedule_recurring(DeviceId::new(1), 0.0, 0.5);
        assert_eq!(clock.active_timers(), 1);

        clock.cancel(id);
        assert_eq!(clock.active_timers(), 0);
        assert!(drain(&mut clock, 10.0).is_empty());

        // Cancelling twice is harmless
        clock.cancel(id);
    }

    #[test]
    fn test_first_fire_not_in_the_past() {
        let mut clock = VirtualClock::starting_at(2.0);
        clock.schedule_recurring(DeviceId::new(1), 1.0, 1.0);
        assert_eq!(clock.next_fire_time(), Some(2.0));
    }
}
