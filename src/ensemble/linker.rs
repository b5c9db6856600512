// Linker - Symmetric link sets keyed by device id
//
// Each device has its own peer set. Both sides of a pair are validated
// before either is touched, so a link is never one-sided.

use crate::DeviceId;
use crate::sequencer::{SequencerError, SequencerResult};
use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};

/// Link membership for every device on a stage
///
/// Holds ids only. It never decides when a device exists or plays.
#[derive(Debug, Clone, Default)]
pub struct Linker {
    peers: HashMap<DeviceId, BTreeSet<DeviceId>>,
    /// Devices accepting the next pairing gesture
    armed: HashSet<DeviceId>,
    /// Cap on each device's peer set, `None` for no cap
    max_peers: Option<usize>,
}

impl Linker {
    pub fn new(max_peers: Option<usize>) -> Self {
        Self {
            max_peers,
            ..Self::default()
        }
    }

    /// Peers of a device, in id order
    pub fn peers_of(&self, device: DeviceId) -> BTreeSet<DeviceId> {
        self.peers.get(&device).cloned().unwrap_or_default()
    }

    pub fn peer_count(&self, device: DeviceId) -> usize {
        self.peers.get(&device).map_or(0, BTreeSet::len)
    }

    pub fn are_linked(&self, a: DeviceId, b: DeviceId) -> bool {
        self.peers.get(&a).is_some_and(|set| set.contains(&b))
    }

    fn has_room(&self, device: DeviceId) -> bool {
        self.max_peers
            .is_none_or(|max| self.peer_count(device) < max)
    }

    /// Link two devices
    ///
    /// Returns `Ok(false)` when they were already linked. Playback state is
    /// the caller's check; this only enforces the link rules themselves.
    pub fn link(&mut self, a: DeviceId, b: DeviceId) -> SequencerResult<bool> {
        if a == b {
            return Err(SequencerError::LinkRejected(format!(
                "device {} cannot link to itself",
                a
            )));
        }
        if self.are_linked(a, b) {
            return Ok(false);
        }
        for device in [a, b] {
            if !self.has_room(device) {
                return Err(SequencerError::LinkRejected(format!(
                    "device {} has no free link slots",
                    device
                )));
            }
        }

        self.peers.entry(a).or_default().insert(b);
        self.peers.entry(b).or_default().insert(a);
        log::debug!(target: "ensemble", "linked {} <-> {}", a, b);
        Ok(true)
    }

    /// Remove a device from every peer set and clear its own
    ///
    /// Returns the peers it was linked to.
    pub fn unlink_all(&mut self, device: DeviceId) -> BTreeSet<DeviceId> {
        let former = self.peers.remove(&device).unwrap_or_default();
        for peer in &former {
            if let Some(set) = self.peers.get_mut(peer) {
                set.remove(&device);
                if set.is_empty() {
                    self.peers.remove(peer);
                }
            }
        }
        if !former.is_empty() {
            log::debug!(target: "ensemble", "unlinked {} from {:?}", device, former);
        }
        former
    }

    /// Every device reachable through links, including `device`, in id order
    pub fn group_of(&self, device: DeviceId) -> Vec<DeviceId> {
        let mut seen = BTreeSet::from([device]);
        let mut queue = VecDeque::from([device]);

        while let Some(current) = queue.pop_front() {
            for peer in self.peers.get(&current).into_iter().flatten() {
                if seen.insert(*peer) {
                    queue.push_back(*peer);
                }
            }
        }

        seen.into_iter().collect()
    }

    /// Accept the next pairing gesture aimed at `device`
    pub fn arm(&mut self, device: DeviceId) {
        self.armed.insert(device);
    }

    pub fn disarm(&mut self, device: DeviceId) {
        self.armed.remove(&device);
    }

    pub fn is_armed(&self, device: DeviceId) -> bool {
        self.armed.contains(&device)
    }

    /// Drop everything known about a device
    pub fn forget(&mut self, device: DeviceId) -> BTreeSet<DeviceId> {
        self.disarm(device);
        self.unlink_all(device)
    }
}
