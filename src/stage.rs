// Stage - Owns every device sequencer, their links and the clock
//
// All commands enter here. Link changes and ensemble play touch several
// devices, so they are coordinated at this level; everything a single device
// decides on its own stays in `Sequencer`.

use crate::DeviceId;
use crate::clock::{Clock, VirtualClock};
use crate::config::{Config, ConfigError};
use crate::ensemble::Linker;
use crate::instrument::{Instrument, InstrumentCatalog};
use crate::messaging::{
    Notification, NotificationConsumer, NotificationKind, NotificationProducer,
    create_notification_channel,
};
use crate::sequencer::{
    ErrorLog, LoopMode, Sequencer, SequencerError, SequencerResult, SequencerState, Timing,
};
use ringbuf::traits::Producer;
use std::collections::{BTreeMap, BTreeSet};

/// Full state of one device, links included
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceSnapshot {
    pub sequencer: SequencerState,
    pub peers: BTreeSet<DeviceId>,
    pub autolink_armed: bool,
}

/// A set of devices sharing one clock
pub struct Stage<C: Clock = VirtualClock> {
    config: Config,
    catalog: InstrumentCatalog,
    timing: Timing,
    devices: BTreeMap<DeviceId, Sequencer>,
    linker: Linker,
    clock: C,
    notifications: NotificationProducer,
    next_id: u32,
}

impl Stage<VirtualClock> {
    /// Stage on a fresh virtual clock, returning the notification reader
    pub fn with_virtual_clock(config: Config) -> Result<(Self, NotificationConsumer), ConfigError> {
        Self::new(config, VirtualClock::new())
    }
}

impl<C: Clock> Stage<C> {
    pub fn new(config: Config, clock: C) -> Result<(Self, NotificationConsumer), ConfigError> {
        config.validate()?;
        let catalog = config.catalog()?;
        let timing = config.initial_timing()?;
        let (notifications, consumer) = create_notification_channel(config.notification_capacity);

        let stage = Self {
            linker: Linker::new(config.max_peers),
            config,
            catalog,
            timing,
            devices: BTreeMap::new(),
            clock,
            notifications,
            next_id: 0,
        };
        Ok((stage, consumer))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn catalog(&self) -> &InstrumentCatalog {
        &self.catalog
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn now(&self) -> f64 {
        self.clock.now()
    }

    /// Add a device bound to the default instrument
    pub fn add_device(&mut self) -> DeviceId {
        let instrument = self.catalog.default_instrument();
        self.insert_device(Some(instrument))
    }

    /// Add a device that must select an instrument before it can play
    pub fn add_unbound_device(&mut self) -> DeviceId {
        self.insert_device(None)
    }

    fn insert_device(&mut self, instrument: Option<Instrument>) -> DeviceId {
        self.next_id += 1;
        let id = DeviceId::new(self.next_id);
        let sequencer = Sequencer::new(
            id,
            self.timing,
            self.config.timing,
            self.config.limits,
            instrument,
        );
        self.devices.insert(id, sequencer);
        log::debug!(target: "stage", "device {} added", id);
        id
    }

    /// Tear a device down: playback stopped, links removed, state dropped
    pub fn remove_device(&mut self, id: DeviceId) -> SequencerResult<()> {
        self.reset(id, true)?;
        self.devices.remove(&id);
        log::debug!(target: "stage", "device {} removed", id);
        Ok(())
    }

    pub fn device_ids(&self) -> Vec<DeviceId> {
        self.devices.keys().copied().collect()
    }

    pub fn device(&self, id: DeviceId) -> SequencerResult<&Sequencer> {
        self.devices.get(&id).ok_or(SequencerError::UnknownDevice(id))
    }

    fn device_mut(&mut self, id: DeviceId) -> SequencerResult<&mut Sequencer> {
        self.devices
            .get_mut(&id)
            .ok_or(SequencerError::UnknownDevice(id))
    }

    pub fn snapshot(&self, id: DeviceId) -> SequencerResult<DeviceSnapshot> {
        Ok(DeviceSnapshot {
            sequencer: self.device(id)?.snapshot(),
            peers: self.linker.peers_of(id),
            autolink_armed: self.linker.is_armed(id),
        })
    }

    pub fn peers_of(&self, id: DeviceId) -> BTreeSet<DeviceId> {
        self.linker.peers_of(id)
    }

    /// Devices that play together with `id`, including itself
    pub fn ensemble_of(&self, id: DeviceId) -> Vec<DeviceId> {
        self.linker.group_of(id)
    }

    // ---- single-device configuration ----

    pub fn set_notes(&mut self, id: DeviceId, text: &str) -> SequencerResult<()> {
        let result = self.device_mut(id)?.set_notes(text);
        self.flush(id);
        result
    }

    pub fn set_timing(&mut self, id: DeviceId, seconds: f64) -> SequencerResult<()> {
        self.device_mut(id)?.set_timing(seconds)
    }

    pub fn set_timing_text(&mut self, id: DeviceId, text: &str) -> SequencerResult<()> {
        self.device_mut(id)?.set_timing_text(text)
    }

    pub fn set_instrument(&mut self, id: DeviceId, name: &str) -> SequencerResult<()> {
        let sequencer = self
            .devices
            .get_mut(&id)
            .ok_or(SequencerError::UnknownDevice(id))?;
        sequencer.set_instrument(name, &self.catalog)
    }

    pub fn toggle_loop(&mut self, id: DeviceId) -> SequencerResult<LoopMode> {
        let mode = self.device_mut(id)?.toggle_loop()?;
        self.flush(id);
        Ok(mode)
    }

    pub fn lock_loop(&mut self, id: DeviceId) -> SequencerResult<()> {
        self.device_mut(id)?.lock_loop();
        self.flush(id);
        Ok(())
    }

    pub fn error_log(&self, id: DeviceId) -> SequencerResult<&ErrorLog> {
        Ok(self.device(id)?.error_log())
    }

    /// Error log formatted for display
    pub fn view_errors(&self, id: DeviceId) -> SequencerResult<String> {
        Ok(self.error_log(id)?.to_string())
    }

    // ---- playback ----

    /// Start `conductor` and every idle member of its ensemble at the same instant
    ///
    /// The conductor must be playable. Other members play their own notes at
    /// their own timing; a member that cannot start is skipped.
    pub fn play(&mut self, conductor: DeviceId) -> SequencerResult<()> {
        let start_at = self.clock.now();
        let sequencer = self
            .devices
            .get_mut(&conductor)
            .ok_or(SequencerError::UnknownDevice(conductor))?;
        sequencer.ready(&mut self.clock, start_at)?;
        self.flush(conductor);

        for member in self.linker.group_of(conductor) {
            if member == conductor {
                continue;
            }
            let Some(sequencer) = self.devices.get_mut(&member) else {
                continue;
            };
            if !sequencer.state().is_idle() {
                log::debug!(target: "ensemble", "device {} busy, skipped by {}", member, conductor);
                continue;
            }
            match sequencer.ready(&mut self.clock, start_at) {
                Ok(()) => self.flush(member),
                Err(e) => {
                    log::warn!(
                        target: "ensemble",
                        "device {} skipped by {}: {}",
                        member,
                        conductor,
                        e
                    )
                }
            }
        }
        Ok(())
    }

    /// Ask `id` and every playing member of its ensemble to stop at their next tick
    pub fn stop(&mut self, id: DeviceId) -> SequencerResult<()> {
        self.device(id)?;
        for member in self.linker.group_of(id) {
            if let Some(sequencer) = self.devices.get_mut(&member) {
                sequencer.request_stop();
            }
        }
        Ok(())
    }

    /// Cancel playback on one device; a hard reset also drops its notes and links
    pub fn reset(&mut self, id: DeviceId, hard: bool) -> SequencerResult<()> {
        let sequencer = self
            .devices
            .get_mut(&id)
            .ok_or(SequencerError::UnknownDevice(id))?;
        sequencer.reset(&mut self.clock, hard);
        self.flush(id);

        if hard {
            self.forget_links(id);
        }
        Ok(())
    }

    /// Anchor or un-anchor a device. Un-anchoring stops it and drops its links.
    pub fn set_anchored(&mut self, id: DeviceId, anchored: bool) -> SequencerResult<()> {
        let sequencer = self
            .devices
            .get_mut(&id)
            .ok_or(SequencerError::UnknownDevice(id))?;
        sequencer.set_anchored(anchored);
        if !anchored {
            sequencer.reset(&mut self.clock, false);
            self.flush(id);
            self.forget_links(id);
        }
        Ok(())
    }

    // ---- time ----

    /// Deliver every timer fire up to `until`, in time order
    pub fn advance_to(&mut self, until: f64) {
        while let Some(fire) = self.clock.next_due(until) {
            match self.devices.get_mut(&fire.owner) {
                Some(sequencer) => {
                    sequencer.on_tick(&mut self.clock, fire.timer);
                    self.flush(fire.owner);
                }
                None => self.clock.cancel(fire.timer),
            }
        }
        self.clock.settle(until);
    }

    pub fn advance_by(&mut self, seconds: f64) {
        let until = self.clock.now() + seconds;
        self.advance_to(until);
    }

    // ---- links ----

    /// Link two idle devices
    pub fn link(&mut self, a: DeviceId, b: DeviceId) -> SequencerResult<()> {
        self.device(a)?.ensure_reconfigurable("link")?;
        self.device(b)?.ensure_reconfigurable("link")?;
        if self.linker.link(a, b)? {
            self.emit(a, NotificationKind::Linked { peer: b });
            self.emit(b, NotificationKind::Linked { peer: a });
        }
        Ok(())
    }

    /// Remove every link of a device; it and its peers must be idle
    pub fn unlink(&mut self, id: DeviceId) -> SequencerResult<()> {
        self.device(id)?.ensure_reconfigurable("unlink")?;
        for peer in self.linker.peers_of(id) {
            if let Some(sequencer) = self.devices.get(&peer) {
                sequencer.ensure_reconfigurable("unlink")?;
            }
        }
        self.unlink_and_notify(id);
        Ok(())
    }

    /// Accept the next pairing gesture aimed at `id`
    pub fn arm_autolink(&mut self, id: DeviceId) -> SequencerResult<()> {
        self.device(id)?.ensure_reconfigurable("arm autolink")?;
        self.linker.arm(id);
        Ok(())
    }

    /// Pairing gesture from `initiator` to `target`; links only if `target` is armed
    pub fn pair(&mut self, initiator: DeviceId, target: DeviceId) -> SequencerResult<()> {
        self.device(initiator)?;
        self.device(target)?;
        if !self.linker.is_armed(target) {
            return Err(SequencerError::LinkRejected(format!(
                "device {} is not accepting pairing",
                target
            )));
        }
        self.link(initiator, target)?;
        self.linker.disarm(target);
        Ok(())
    }

    fn forget_links(&mut self, id: DeviceId) {
        let peers = self.linker.forget(id);
        self.notify_unlinked(id, peers);
    }

    fn unlink_and_notify(&mut self, id: DeviceId) {
        let peers = self.linker.unlink_all(id);
        self.notify_unlinked(id, peers);
    }

    fn notify_unlinked(&mut self, id: DeviceId, peers: BTreeSet<DeviceId>) {
        for peer in peers {
            self.emit(id, NotificationKind::Unlinked { peer });
            self.emit(peer, NotificationKind::Unlinked { peer: id });
        }
    }

    // ---- notifications ----

    /// Forward a device's pending effects to the notification channel
    fn flush(&mut self, id: DeviceId) {
        let Some(sequencer) = self.devices.get_mut(&id) else {
            return;
        };
        for kind in sequencer.drain_events() {
            let at = self.clock.now();
            Self::push(&mut self.notifications, Notification::new(id, at, kind));
        }
    }

    fn emit(&mut self, id: DeviceId, kind: NotificationKind) {
        let at = self.clock.now();
        Self::push(&mut self.notifications, Notification::new(id, at, kind));
    }

    fn push(producer: &mut NotificationProducer, notification: Notification) {
        if let Err(dropped) = producer.try_push(notification) {
            log::warn!(target: "stage", "notification channel full, dropped: {}", dropped);
        }
    }
}
