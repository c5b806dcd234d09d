use std::{collections::BTreeMap, mem};

use log::{debug, info, warn};

use lobby_shared::{
    ClientLoadState, ClientMessage, ConnectionId, GamePlayerKey, HostType, LoadBarrier,
    ParticipantKey, Replicated, ReplicationUpdate, SeatTable, ServerMessage,
};

use crate::{
    control::{ControlSource, DeviceQueue},
    events::ClientEvents,
    replica::{GamePlayerReplica, ParticipantReplica},
    transport::ClientTransport,
    ClientConfig, LobbyClientError,
};

/// An observer of one lobby session.
///
/// Everything here is a replica: it changes only when the Server says so.
/// Writes go out as [`ClientMessage`] requests, and every applied change is
/// reported through [`ClientEvents`].
pub struct LobbyClient<C: ControlSource> {
    connection: ConnectionId,
    config: ClientConfig,
    transport: Box<dyn ClientTransport>,
    control: C,
    admitted: Option<bool>,
    seats: SeatTable,
    participants: BTreeMap<ParticipantKey, ParticipantReplica>,
    game_players: BTreeMap<GamePlayerKey, GamePlayerReplica>,
    trackers: BTreeMap<ConnectionId, Replicated<ClientLoadState>>,
    barrier: LoadBarrier,
    incoming_events: ClientEvents,
}

impl<C: ControlSource> LobbyClient<C> {
    /// Create a new LobbyClient for the given transport-level connection
    pub fn new<T: ClientTransport + 'static>(
        connection: ConnectionId,
        config: ClientConfig,
        transport: T,
        control: C,
    ) -> Self {
        Self {
            connection,
            config,
            transport: Box::new(transport),
            control,
            admitted: None,
            seats: SeatTable::new(0),
            participants: BTreeMap::new(),
            game_players: BTreeMap::new(),
            trackers: BTreeMap::new(),
            barrier: LoadBarrier::new(),
            incoming_events: ClientEvents::new(),
        }
    }

    pub fn connection_id(&self) -> ConnectionId {
        self.connection
    }

    pub fn is_host(&self) -> bool {
        self.config.is_host
    }

    pub fn control(&self) -> &C {
        &self.control
    }

    pub fn control_mut(&mut self) -> &mut C {
        &mut self.control
    }

    /// Returns all events produced since the last call and resets the buffer
    pub fn receive(&mut self) -> ClientEvents {
        mem::replace(&mut self.incoming_events, ClientEvents::new())
    }

    // Requests

    /// The transport is ready. The host is already admitted, anyone else
    /// asks for admission, presenting the configured credential.
    pub fn connected(&mut self) {
        if self.config.is_host {
            self.admitted = Some(true);
            return;
        }
        info!("connection {:?} requesting admission", self.connection);
        self.transport.send(ClientMessage::AdmissionRequest {
            credential: self.config.credential.clone(),
        });
    }

    /// `None` until the Server has answered
    pub fn admission(&self) -> Option<bool> {
        self.admitted
    }

    pub fn is_admitted(&self) -> bool {
        self.admitted == Some(true)
    }

    /// Ask for a seat for this connection
    pub fn request_seat(&mut self) {
        self.transport
            .send(ClientMessage::SeatRequest { connection: None });
    }

    /// Ask for a seat on behalf of another connection
    pub fn request_seat_for(&mut self, connection: ConnectionId) {
        self.transport.send(ClientMessage::SeatRequest {
            connection: Some(connection),
        });
    }

    /// The scene-load queue started
    pub fn load_queue_started(&mut self) {
        self.transport
            .send(ClientMessage::LoadState(ClientLoadState::Loading));
    }

    /// The scene-load queue ended
    pub fn load_queue_ended(&mut self) {
        self.transport
            .send(ClientMessage::LoadState(ClientLoadState::Loaded));
    }

    // Incoming

    pub fn receive_message(&mut self, message: ServerMessage) {
        match message {
            ServerMessage::AdmissionResult { admitted } => {
                if admitted {
                    info!("connection {:?} admitted", self.connection);
                } else {
                    info!("connection {:?} rejected", self.connection);
                }
                self.admitted = Some(admitted);
                self.incoming_events.push_admission_result(admitted);
            }
            ServerMessage::SeatGrantFailed { requested_by } => {
                info!(
                    "seat request by {:?} refused for connection {:?}",
                    requested_by, self.connection
                );
                // a request made on our behalf never took a pending device
                if requested_by == self.connection {
                    self.control.on_seat_grant_failed();
                }
                self.incoming_events.push_seat_grant_failure(&requested_by);
            }
            ServerMessage::Replication(update) => {
                if let Err(error) = self.apply_update(update) {
                    warn!("failed to apply replication update: {}", error);
                    self.incoming_events.push_error(error);
                }
            }
        }
    }

    // Replicas

    /// Lobby capacity, 0 until the Server has sent it
    pub fn capacity(&self) -> usize {
        self.seats.capacity()
    }

    pub fn seat_table(&self) -> &SeatTable {
        &self.seats
    }

    /// Whether the lobby looks like it has room, as far as this replica
    /// knows. Outstanding reservations are invisible to observers.
    pub fn can_join(&self) -> bool {
        self.seats.occupied_count() < self.seats.capacity()
    }

    pub fn participant(&self, participant: &ParticipantKey) -> Option<&ParticipantReplica> {
        self.participants.get(participant)
    }

    pub fn participants(&self) -> impl Iterator<Item = (&ParticipantKey, &ParticipantReplica)> {
        self.participants.iter()
    }

    pub fn participant_count(&self) -> usize {
        self.participants.len()
    }

    /// Participants owned by this connection
    pub fn local_participants(&self) -> Vec<ParticipantKey> {
        self.participants
            .iter()
            .filter(|(_, participant)| participant.owner() == self.connection)
            .map(|(key, _)| *key)
            .collect()
    }

    pub fn game_player(&self, game_player: &GamePlayerKey) -> Option<&GamePlayerReplica> {
        self.game_players.get(game_player)
    }

    pub fn game_player_count(&self) -> usize {
        self.game_players.len()
    }

    pub fn load_state(&self, connection: &ConnectionId) -> Option<ClientLoadState> {
        self.trackers.get(connection).map(|state| **state)
    }

    pub fn local_load_state(&self) -> Option<ClientLoadState> {
        self.load_state(&self.connection)
    }

    pub fn tracked_connection_count(&self) -> usize {
        self.trackers.len()
    }

    pub fn all_loaded(&self) -> bool {
        self.barrier.all_loaded()
    }

    /// Times this replica has seen the barrier fire, counting the cycles
    /// that ran before it joined
    pub fn barrier_epoch(&self) -> u64 {
        self.barrier.epoch()
    }

    // Private methods

    fn apply_update(&mut self, update: ReplicationUpdate) -> Result<(), LobbyClientError> {
        match update {
            ReplicationUpdate::LobbyInfo {
                capacity,
                barrier_epoch,
            } => {
                self.barrier.resume_at(barrier_epoch);
                if capacity != self.seats.capacity() {
                    let mut seats = SeatTable::new(capacity);
                    for (key, participant) in self.participants.iter() {
                        seats.occupy(participant.index(), *key);
                    }
                    self.seats = seats;
                }
            }
            ReplicationUpdate::ParticipantSpawned {
                participant,
                owner,
                index,
                game_player,
            } => {
                if self.participants.contains_key(&participant) {
                    return Err(LobbyClientError::DuplicateParticipant { participant });
                }
                self.participants.insert(
                    participant,
                    ParticipantReplica::new(owner, index, game_player),
                );
                if !self.seats.occupy(index, participant) {
                    warn!(
                        "seat {} replica disagrees with participant {:?}",
                        index, participant
                    );
                }
                self.incoming_events.push_participant_add(&participant);

                if owner == self.connection {
                    self.bind_control(participant);
                }
            }
            ReplicationUpdate::ParticipantIndex { participant, index } => {
                let record = self
                    .participants
                    .get_mut(&participant)
                    .ok_or(LobbyClientError::UnknownParticipant { participant })?;
                if let Some(change) = record.mirror_index(index)? {
                    self.seats.relocate(participant, Some(change.old), change.new);
                    self.incoming_events.push_participant_index_change(
                        &participant,
                        change.old,
                        change.new,
                    );
                }
            }
            ReplicationUpdate::ParticipantBound {
                participant,
                game_player,
            } => {
                let record = self
                    .participants
                    .get_mut(&participant)
                    .ok_or(LobbyClientError::UnknownParticipant { participant })?;
                if let Some(change) = record.mirror_game_player(game_player)? {
                    self.incoming_events
                        .push_game_player_change(&participant, change.old, change.new);
                }
            }
            ReplicationUpdate::ParticipantDespawned { participant } => {
                let record = self
                    .participants
                    .remove(&participant)
                    .ok_or(LobbyClientError::UnknownParticipant { participant })?;
                self.seats.release(record.index(), &participant);
                if record.owner() == self.connection {
                    self.control.unbind(&participant);
                }
                self.incoming_events.push_participant_remove(&participant);
            }
            ReplicationUpdate::GamePlayerSpawned {
                game_player,
                owner,
                index,
                placement,
            } => {
                if self.game_players.contains_key(&game_player) {
                    return Err(LobbyClientError::DuplicateGamePlayer { game_player });
                }
                self.game_players
                    .insert(game_player, GamePlayerReplica::new(owner, index, placement));
                self.incoming_events.push_game_player_add(&game_player);
            }
            ReplicationUpdate::GamePlayerIndex { game_player, index } => {
                self.game_players
                    .get_mut(&game_player)
                    .ok_or(LobbyClientError::UnknownGamePlayer { game_player })?
                    .mirror_index(index)?;
            }
            ReplicationUpdate::GamePlayerDespawned { game_player } => {
                self.game_players
                    .remove(&game_player)
                    .ok_or(LobbyClientError::UnknownGamePlayer { game_player })?;
                self.incoming_events.push_game_player_remove(&game_player);
            }
            ReplicationUpdate::TrackerSpawned { connection, state } => {
                if self.trackers.contains_key(&connection) {
                    return Err(LobbyClientError::DuplicateTracker { connection });
                }
                self.trackers
                    .insert(connection, Replicated::new(HostType::Client, state));
                self.aggregate_load_states();
            }
            ReplicationUpdate::LoadState { connection, state } => {
                let tracker = self
                    .trackers
                    .get_mut(&connection)
                    .ok_or(LobbyClientError::UnknownTracker { connection })?;
                if let Some(change) = tracker.mirror(state)? {
                    debug!(
                        "connection {:?} load state {} -> {}",
                        connection,
                        change.old.name(),
                        change.new.name()
                    );
                    if change.old == ClientLoadState::Loading
                        && change.new == ClientLoadState::Loaded
                    {
                        self.incoming_events.push_client_load(&connection);
                    }
                    self.aggregate_load_states();
                }
            }
            ReplicationUpdate::TrackerDespawned { connection } => {
                self.trackers
                    .remove(&connection)
                    .ok_or(LobbyClientError::UnknownTracker { connection })?;
                self.aggregate_load_states();
            }
        }

        Ok(())
    }

    fn bind_control(&mut self, participant: ParticipantKey) {
        if self.control.bind(&participant) {
            return;
        }
        info!(
            "no control source for participant {:?}, asking for its removal",
            participant
        );
        self.transport
            .send(ClientMessage::ControlBindingFailed(participant));
    }

    fn aggregate_load_states(&mut self) {
        if self.barrier.update(self.trackers.values().map(|state| state.get())) {
            self.incoming_events.push_all_loaded(self.barrier.epoch());
        }
    }
}

impl<D: PartialEq> LobbyClient<DeviceQueue<D>> {
    /// Queues a local device and asks for a seat for it. Refused when the
    /// lobby looks full or the device is already waiting or in use.
    pub fn join_local(&mut self, device: D) -> bool {
        if !self.can_join() {
            debug!("lobby looks full, not queueing device");
            return false;
        }
        if !self.control.enqueue(device) {
            debug!("device already queued");
            return false;
        }
        self.request_seat();
        true
    }
}
