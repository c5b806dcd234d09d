use std::collections::{BTreeMap, VecDeque};

use log::{debug, info};

use lobby_shared::ParticipantKey;

/// Supplies a control source (input device, AI driver, ...) for every
/// participant this client owns
pub trait ControlSource {
    /// A participant owned by this client was added. Returns false when no
    /// control source is available, the client then asks the Server to
    /// remove the participant.
    fn bind(&mut self, participant: &ParticipantKey) -> bool;

    /// One of this client's participants is gone
    fn unbind(&mut self, _participant: &ParticipantKey) {}

    /// The Server refused a seat request made by this client
    fn on_seat_grant_failed(&mut self) {}
}

/// Binds every participant. For headless clients and bots.
#[derive(Clone, Copy, Debug, Default)]
pub struct AutoBind;

impl ControlSource for AutoBind {
    fn bind(&mut self, _participant: &ParticipantKey) -> bool {
        true
    }
}

/// Local input devices waiting for a seat, first come first served.
///
/// Devices are queued by `LobbyClient::join_local`. A granted participant
/// takes the oldest pending device; a refused seat request drops it.
pub struct DeviceQueue<D> {
    pending: VecDeque<D>,
    bound: BTreeMap<ParticipantKey, D>,
}

impl<D> Default for DeviceQueue<D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D> DeviceQueue<D> {
    pub fn new() -> Self {
        Self {
            pending: VecDeque::new(),
            bound: BTreeMap::new(),
        }
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn bound_count(&self) -> usize {
        self.bound.len()
    }

    pub fn device_for(&self, participant: &ParticipantKey) -> Option<&D> {
        self.bound.get(participant)
    }
}

impl<D: PartialEq> DeviceQueue<D> {
    pub fn is_pending(&self, device: &D) -> bool {
        self.pending.contains(device)
    }

    pub fn is_bound(&self, device: &D) -> bool {
        self.bound.values().any(|bound| bound == device)
    }

    /// Returns false if the device is already waiting or already in use
    pub(crate) fn enqueue(&mut self, device: D) -> bool {
        if self.is_pending(&device) || self.is_bound(&device) {
            return false;
        }
        self.pending.push_back(device);
        true
    }
}

impl<D> ControlSource for DeviceQueue<D> {
    fn bind(&mut self, participant: &ParticipantKey) -> bool {
        let Some(device) = self.pending.pop_front() else {
            info!("no pending device for participant {:?}", participant);
            return false;
        };
        debug!("bound a device to participant {:?}", participant);
        self.bound.insert(*participant, device);
        true
    }

    fn unbind(&mut self, participant: &ParticipantKey) {
        self.bound.remove(participant);
    }

    fn on_seat_grant_failed(&mut self) {
        if self.pending.pop_front().is_some() {
            debug!("seat refused, dropped the oldest pending device");
        }
    }
}
