use std::collections::BTreeMap;

use log::debug;

use lobby_shared::{ClientLoadState, ConnectionId, LoadBarrier, Replicated};

use crate::LobbyServerError;

/// One per admitted connection, holding that connection's replicated load
/// state
pub struct ConnectionLoadTracker {
    owner: ConnectionId,
    state: Replicated<ClientLoadState>,
}

impl ConnectionLoadTracker {
    fn new(owner: ConnectionId) -> Self {
        Self {
            owner,
            state: Replicated::host_owned(ClientLoadState::Idle),
        }
    }

    pub fn owner(&self) -> ConnectionId {
        self.owner
    }

    pub fn state(&self) -> ClientLoadState {
        *self.state
    }

    pub fn is_loaded(&self) -> bool {
        self.state.is_loaded()
    }
}

/// Result of a connection reporting a new load state
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LoadStateChange {
    pub connection: ConnectionId,
    pub previous: ClientLoadState,
    pub current: ClientLoadState,
}

impl LoadStateChange {
    /// Only a `Loading -> Loaded` edge counts as having finished loading
    pub fn finished_loading(&self) -> bool {
        self.previous == ClientLoadState::Loading && self.current == ClientLoadState::Loaded
    }
}

/// Every connection's tracker plus the global all-loaded barrier
#[derive(Default)]
pub struct LoadTrackers {
    trackers: BTreeMap<ConnectionId, ConnectionLoadTracker>,
    barrier: LoadBarrier,
}

impl LoadTrackers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts tracking a connection in the `Idle` state. Returns false if it
    /// was already tracked.
    pub fn track(&mut self, connection: ConnectionId) -> bool {
        if self.trackers.contains_key(&connection) {
            return false;
        }
        self.trackers
            .insert(connection, ConnectionLoadTracker::new(connection));
        true
    }

    pub fn untrack(&mut self, connection: &ConnectionId) -> Option<ConnectionLoadTracker> {
        self.trackers.remove(connection)
    }

    pub fn get(&self, connection: &ConnectionId) -> Option<&ConnectionLoadTracker> {
        self.trackers.get(connection)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ConnectionLoadTracker> {
        self.trackers.values()
    }

    pub fn len(&self) -> usize {
        self.trackers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trackers.is_empty()
    }

    pub fn all_loaded(&self) -> bool {
        self.barrier.all_loaded()
    }

    /// Number of times the barrier has fired this session
    pub fn barrier_epoch(&self) -> u64 {
        self.barrier.epoch()
    }

    /// Applies a connection's report about its own progress. `Idle` can't be
    /// requested, only the barrier reset writes it. Repeating the current
    /// state changes nothing and yields `None`.
    pub fn request_state(
        &mut self,
        connection: &ConnectionId,
        state: ClientLoadState,
    ) -> Result<Option<LoadStateChange>, LobbyServerError> {
        let Some(tracker) = self.trackers.get_mut(connection) else {
            return Err(LobbyServerError::NoLoadTracker {
                connection: *connection,
            });
        };

        let previous = *tracker.state;
        if state == ClientLoadState::Idle && previous != ClientLoadState::Idle {
            return Err(LobbyServerError::invalid_load_transition(previous, state));
        }

        if !tracker.state.set(state)? {
            return Ok(None);
        }

        debug!(
            "connection {:?} load state {} -> {}",
            connection,
            previous.name(),
            state.name()
        );

        Ok(Some(LoadStateChange {
            connection: *connection,
            previous,
            current: state,
        }))
    }

    /// Recomputes the barrier over every tracked connection. Returns true on
    /// the rising edge only.
    pub fn aggregate(&mut self) -> bool {
        self.barrier
            .update(self.trackers.values().map(|tracker| tracker.state.get()))
    }

    /// Moves every tracker back to `Idle` so the next load cycle can fire the
    /// barrier again. Returns the connections whose state changed.
    pub fn reset_all(&mut self) -> Result<Vec<ConnectionId>, LobbyServerError> {
        let mut changed = Vec::new();
        for tracker in self.trackers.values_mut() {
            if tracker.state.set(ClientLoadState::Idle)? {
                changed.push(tracker.owner);
            }
        }
        Ok(changed)
    }

    pub fn clear(&mut self) {
        self.trackers.clear();
        self.barrier.reset();
    }
}
