use std::mem;

use log::{info, warn};

use lobby_shared::{
    BigMap, ClientLoadState, ClientMessage, ConnectionId, GamePlayerKey, ParticipantKey,
    ReplicationUpdate, SeatTable, ServerMessage,
};

use crate::{
    admission::{AdmissionGate, AdmissionStatus, ConnectionOrigin, CredentialSource, HostPassword},
    events::LobbyEvents,
    load_tracker::LoadTrackers,
    participant::{GamePlayer, LobbyParticipant},
    seats::SlotAllocator,
    spawner::{SpawnMode, Spawner},
    transport::ServerTransport,
    ConfigError, LobbyServerError, ServerConfig,
};

/// The lobby authority for one session.
///
/// Every handler runs to completion before the next one starts, so
/// scan-then-occupy in the seat table, the barrier aggregation and the
/// spawn bookkeeping never interleave. All state is scoped to this value;
/// dropping it ends the session.
pub struct LobbyServer {
    transport: Box<dyn ServerTransport>,
    gate: AdmissionGate,
    seats: SlotAllocator,
    participants: BigMap<ParticipantKey, LobbyParticipant>,
    game_players: BigMap<GamePlayerKey, GamePlayer>,
    load_trackers: LoadTrackers,
    spawner: Spawner,
    incoming_events: LobbyEvents,
}

impl LobbyServer {
    /// Create a new LobbyServer. Fails if the config is unusable.
    pub fn new<T: ServerTransport + 'static>(
        config: ServerConfig,
        transport: T,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let ServerConfig {
            capacity,
            placements,
            spawn_mode,
            host_password,
        } = config;

        let credentials = host_password.map(|password| -> Box<dyn CredentialSource> {
            Box::new(HostPassword::new(password))
        });

        Ok(Self {
            transport: Box::new(transport),
            gate: AdmissionGate::new(credentials),
            seats: SlotAllocator::new(capacity),
            participants: BigMap::new(),
            game_players: BigMap::new(),
            load_trackers: LoadTrackers::new(),
            spawner: Spawner::new(spawn_mode, placements),
            incoming_events: LobbyEvents::new(),
        })
    }

    /// Replaces the credential collaborator consulted at admission time
    pub fn set_credentials(&mut self, credentials: Option<Box<dyn CredentialSource>>) {
        self.gate.set_credentials(credentials);
    }

    /// Returns all events produced since the last call and resets the buffer
    pub fn receive(&mut self) -> LobbyEvents {
        mem::replace(&mut self.incoming_events, LobbyEvents::new())
    }

    // Connections

    /// A connection is ready to communicate. The host skips admission and is
    /// admitted immediately, everyone else must send an admission request.
    pub fn connect(&mut self, connection: ConnectionId, origin: ConnectionOrigin) {
        if self.gate.status(&connection).is_some() {
            warn!("connection {:?} is already registered", connection);
            return;
        }

        info!("connection {:?} ready ({:?})", connection, origin);

        if self.gate.register(connection, origin) == AdmissionStatus::Admitted {
            self.incoming_events.push_admission(&connection, true);
            self.on_admitted(connection);
        }
    }

    /// The connection is gone. Its reservation, participants, game players
    /// and load tracker go with it.
    pub fn disconnect(&mut self, connection: ConnectionId) {
        if self.gate.forget(&connection).is_none() {
            return;
        }

        info!("connection {:?} disconnected", connection);

        self.seats.cancel_reservation(&connection);

        for participant in self.participants_for_connection(&connection) {
            self.despawn_participant_internal(&participant);
        }

        if self.load_trackers.untrack(&connection).is_some() {
            self.broadcast(ReplicationUpdate::TrackerDespawned { connection });
            if let Err(error) = self.aggregate_load_states() {
                self.incoming_events.push_error(error);
            }
        }

        self.incoming_events.push_disconnection(&connection);
    }

    /// Dispatches a request received from `sender`. Failures are reported
    /// as `ErrorEvent`s.
    pub fn receive_message(&mut self, sender: &ConnectionId, message: ClientMessage) {
        let result = match message {
            ClientMessage::AdmissionRequest { credential } => {
                self.handle_admission_request(sender, credential.as_deref())
            }
            ClientMessage::SeatRequest { connection } => {
                self.handle_seat_request(sender, connection.unwrap_or(*sender))
            }
            ClientMessage::LoadState(state) => self.handle_load_state(sender, state),
            ClientMessage::ControlBindingFailed(participant) => {
                self.handle_control_binding_failed(sender, &participant)
            }
        };

        if let Err(error) = result {
            self.incoming_events.push_error(error);
        }
    }

    pub fn admission_status(&self, connection: &ConnectionId) -> Option<AdmissionStatus> {
        self.gate.status(connection)
    }

    pub fn is_admitted(&self, connection: &ConnectionId) -> bool {
        self.gate.is_admitted(connection)
    }

    /// Every admitted connection, in id order
    pub fn admitted_connections(&self) -> Vec<ConnectionId> {
        self.gate.admitted()
    }

    // Seats

    pub fn capacity(&self) -> usize {
        self.seats.capacity()
    }

    pub fn occupied_count(&self) -> usize {
        self.seats.occupied_count()
    }

    pub fn reservation_count(&self) -> usize {
        self.seats.reservation_count()
    }

    pub fn is_reserved(&self, connection: &ConnectionId) -> bool {
        self.seats.is_reserved(connection)
    }

    pub fn is_full(&self) -> bool {
        self.seats.is_full()
    }

    pub fn can_join(&self) -> bool {
        self.seats.can_join()
    }

    pub fn seat_table(&self) -> &SeatTable {
        self.seats.table()
    }

    pub fn seat(&self, index: usize) -> Option<ParticipantKey> {
        self.seats.table().get(index)
    }

    /// Seats a participant for `connection`. Any admitted connection may ask
    /// on behalf of any other admitted connection. On failure only the
    /// seated-to-be connection is told, and it may retry later.
    pub fn request_seat_grant(
        &mut self,
        connection: ConnectionId,
    ) -> Result<ParticipantKey, LobbyServerError> {
        self.grant_seat_for(connection, connection)
    }

    /// Moves a participant to another empty seat, vacating the old one
    pub fn relocate_participant(
        &mut self,
        participant: &ParticipantKey,
        index: usize,
    ) -> Result<(), LobbyServerError> {
        let capacity = self.seats.capacity();
        if index >= capacity {
            return Err(LobbyServerError::SeatOutOfRange { index, capacity });
        }
        if let Some(occupant) = self.seats.table().get(index) {
            if occupant != *participant {
                return Err(LobbyServerError::SeatOccupied { index });
            }
        }

        let Some(record) = self.participants.get_mut(participant) else {
            return Err(LobbyServerError::UnknownParticipant {
                participant: *participant,
            });
        };
        let Some(previous) = record.set_index(index)? else {
            return Ok(());
        };
        let game_player = record.game_player();

        // index field first, then the table
        self.seats.relocate_seat(*participant, previous, index);
        self.broadcast(ReplicationUpdate::ParticipantIndex {
            participant: *participant,
            index,
        });

        if let Some(game_player) = game_player {
            if let Some(record) = self.game_players.get_mut(&game_player) {
                if record.set_index(index)? {
                    self.broadcast(ReplicationUpdate::GamePlayerIndex { game_player, index });
                }
            }
        }

        Ok(())
    }

    // Participants

    pub fn participant(&self, participant: &ParticipantKey) -> Option<&LobbyParticipant> {
        self.participants.get(participant)
    }

    pub fn participant_keys(&self) -> Vec<ParticipantKey> {
        self.participants.keys()
    }

    pub fn participants(&self) -> impl Iterator<Item = (ParticipantKey, &LobbyParticipant)> {
        self.participants.iter()
    }

    pub fn participant_count(&self) -> usize {
        self.participants.len()
    }

    pub fn participants_for_connection(&self, connection: &ConnectionId) -> Vec<ParticipantKey> {
        self.participants
            .iter()
            .filter(|(_, participant)| participant.owner() == *connection)
            .map(|(key, _)| key)
            .collect()
    }

    /// Removes a participant, its seat and its game player
    pub fn despawn_participant(
        &mut self,
        participant: &ParticipantKey,
    ) -> Result<(), LobbyServerError> {
        match self.despawn_participant_internal(participant) {
            Some(_) => Ok(()),
            None => Err(LobbyServerError::UnknownParticipant {
                participant: *participant,
            }),
        }
    }

    // Game players

    pub fn game_player(&self, game_player: &GamePlayerKey) -> Option<&GamePlayer> {
        self.game_players.get(game_player)
    }

    pub fn game_players(&self) -> impl Iterator<Item = (GamePlayerKey, &GamePlayer)> {
        self.game_players.iter()
    }

    pub fn game_player_count(&self) -> usize {
        self.game_players.len()
    }

    pub fn spawn_mode(&self) -> SpawnMode {
        self.spawner.mode()
    }

    /// Switches spawn policy, as a scene change would. `Incremental` spawns
    /// every unbound participant right away; `Bulk` waits for the next
    /// barrier.
    pub fn set_spawn_mode(&mut self, mode: SpawnMode) -> Result<(), LobbyServerError> {
        info!("spawn mode set to {:?}", mode);
        self.spawner.set_mode(mode);

        if mode == SpawnMode::Incremental {
            for participant in self.participants.keys() {
                self.spawn_game_player(&participant)?;
            }
        }

        Ok(())
    }

    /// Creates and binds the game player for a participant. Does nothing if
    /// one is already bound, so both spawn modes may race on the same record.
    pub fn spawn_game_player(
        &mut self,
        participant: &ParticipantKey,
    ) -> Result<Option<GamePlayerKey>, LobbyServerError> {
        let Some(record) = self.participants.get(participant) else {
            return Err(LobbyServerError::UnknownParticipant {
                participant: *participant,
            });
        };
        if record.has_game_player() {
            return Ok(None);
        }

        let owner = record.owner();
        let index = record.index();
        let placement = self.spawner.placement_for(index);

        let game_player = self
            .game_players
            .insert(GamePlayer::new(owner, *participant, index, placement));

        info!(
            "spawning game player {:?} for index {} at {:?}",
            game_player, index, placement.position
        );

        self.broadcast(ReplicationUpdate::GamePlayerSpawned {
            game_player,
            owner,
            index,
            placement,
        });

        if let Some(record) = self.participants.get_mut(participant) {
            if record.bind_game_player(Some(game_player))? {
                self.broadcast(ReplicationUpdate::ParticipantBound {
                    participant: *participant,
                    game_player: Some(game_player),
                });
            }
        }

        self.incoming_events
            .push_game_player_spawn(participant, &game_player);

        Ok(Some(game_player))
    }

    // Load states

    pub fn load_state(&self, connection: &ConnectionId) -> Option<ClientLoadState> {
        self.load_trackers.get(connection).map(|tracker| tracker.state())
    }

    pub fn tracked_connection_count(&self) -> usize {
        self.load_trackers.len()
    }

    pub fn all_loaded(&self) -> bool {
        self.load_trackers.all_loaded()
    }

    pub fn barrier_epoch(&self) -> u64 {
        self.load_trackers.barrier_epoch()
    }

    /// Ends the session: every participant is despawned, every connection is
    /// dropped and forgotten. The server can host a new session afterwards.
    pub fn shutdown(&mut self) {
        info!("lobby shutting down");

        for participant in self.participants.keys() {
            self.despawn_participant_internal(&participant);
        }

        let connections: Vec<ConnectionId> =
            self.load_trackers.iter().map(|tracker| tracker.owner()).collect();
        for connection in connections {
            self.broadcast(ReplicationUpdate::TrackerDespawned { connection });
        }

        for connection in self.gate.admitted() {
            self.transport.disconnect(&connection);
        }

        self.gate.clear();
        self.seats.clear();
        self.load_trackers.clear();
        self.game_players.clear();
        self.spawner.set_mode(self.spawner.mode());
    }

    // Private methods

    fn broadcast(&mut self, update: ReplicationUpdate) {
        let recipients = self.gate.admitted();
        self.transport.broadcast(&recipients, update.into());
    }

    fn grant_seat_for(
        &mut self,
        requested_by: ConnectionId,
        connection: ConnectionId,
    ) -> Result<ParticipantKey, LobbyServerError> {
        if !self.gate.is_admitted(&connection) {
            return Err(LobbyServerError::NotAdmitted { connection });
        }

        let participants = &mut self.participants;
        let granted = self.seats.grant_seat(connection, |index| {
            participants.insert(LobbyParticipant::new(connection, index))
        });

        let (index, participant) = match granted {
            Ok(granted) => granted,
            Err(error) => {
                self.transport.send(
                    &connection,
                    ServerMessage::SeatGrantFailed { requested_by },
                );
                self.incoming_events.push_seat_grant_failure(&connection);
                return Err(error);
            }
        };

        info!(
            "seated connection {:?} at index {} as {:?}",
            connection, index, participant
        );

        self.broadcast(ReplicationUpdate::ParticipantSpawned {
            participant,
            owner: connection,
            index,
            game_player: None,
        });
        self.incoming_events.push_participant_add(&participant);

        if self.spawner.spawns_on_participant_added() {
            self.spawn_game_player(&participant)?;
        }

        Ok(participant)
    }

    fn handle_admission_request(
        &mut self,
        sender: &ConnectionId,
        credential: Option<&str>,
    ) -> Result<(), LobbyServerError> {
        let admitted = match self.gate.evaluate(sender, credential, &mut self.seats) {
            Ok(admitted) => admitted,
            Err(error @ LobbyServerError::DuplicateAdmission { .. }) => {
                self.transport.disconnect(sender);
                return Err(error);
            }
            Err(error) => return Err(error),
        };

        self.transport
            .send(sender, ServerMessage::AdmissionResult { admitted });
        self.incoming_events.push_admission(sender, admitted);

        if admitted {
            self.on_admitted(*sender);
        } else {
            self.transport.disconnect(sender);
        }

        Ok(())
    }

    fn on_admitted(&mut self, connection: ConnectionId) {
        // tracked before the snapshot is built, so the snapshot carries it
        let tracked = self.load_trackers.track(connection);

        for update in self.snapshot(&connection) {
            self.transport.send(&connection, update.into());
        }

        if tracked {
            let others: Vec<ConnectionId> = self
                .gate
                .admitted()
                .into_iter()
                .filter(|admitted| *admitted != connection)
                .collect();
            self.transport.broadcast(
                &others,
                ReplicationUpdate::TrackerSpawned {
                    connection,
                    state: ClientLoadState::Idle,
                }
                .into(),
            );
            if let Err(error) = self.aggregate_load_states() {
                self.incoming_events.push_error(error);
            }
        }
    }

    /// Everything a newly admitted observer needs to catch up.
    ///
    /// The recipient's own tracker comes first. It is Idle, so an observer
    /// aggregating after each tracker never sees an all-Loaded prefix.
    fn snapshot(&self, recipient: &ConnectionId) -> Vec<ReplicationUpdate> {
        let mut updates = vec![ReplicationUpdate::LobbyInfo {
            capacity: self.seats.capacity(),
            barrier_epoch: self.load_trackers.barrier_epoch(),
        }];

        for (game_player, record) in self.game_players.iter() {
            updates.push(ReplicationUpdate::GamePlayerSpawned {
                game_player,
                owner: record.owner(),
                index: record.index(),
                placement: record.placement(),
            });
        }

        for (participant, record) in self.participants.iter() {
            updates.push(ReplicationUpdate::ParticipantSpawned {
                participant,
                owner: record.owner(),
                index: record.index(),
                game_player: record.game_player(),
            });
        }

        let (own, others): (Vec<_>, Vec<_>) = self
            .load_trackers
            .iter()
            .partition(|tracker| tracker.owner() == *recipient);
        for tracker in own.into_iter().chain(others) {
            updates.push(ReplicationUpdate::TrackerSpawned {
                connection: tracker.owner(),
                state: tracker.state(),
            });
        }

        updates
    }

    fn require_admitted(&self, connection: &ConnectionId) -> Result<(), LobbyServerError> {
        match self.gate.status(connection) {
            Some(AdmissionStatus::Admitted) => Ok(()),
            Some(_) => Err(LobbyServerError::NotAdmitted {
                connection: *connection,
            }),
            None => Err(LobbyServerError::UnknownConnection {
                connection: *connection,
            }),
        }
    }

    fn handle_seat_request(
        &mut self,
        sender: &ConnectionId,
        connection: ConnectionId,
    ) -> Result<(), LobbyServerError> {
        self.require_admitted(sender)?;
        self.require_admitted(&connection)?;

        match self.grant_seat_for(*sender, connection) {
            Ok(_) => Ok(()),
            // already delivered to the target as SeatGrantFailed
            Err(LobbyServerError::LobbyFull { .. }) | Err(LobbyServerError::NoEmptySeat { .. }) => {
                Ok(())
            }
            Err(error) => Err(error),
        }
    }

    fn handle_load_state(
        &mut self,
        sender: &ConnectionId,
        state: ClientLoadState,
    ) -> Result<(), LobbyServerError> {
        self.require_admitted(sender)?;

        let Some(change) = self.load_trackers.request_state(sender, state)? else {
            return Ok(());
        };

        self.broadcast(ReplicationUpdate::LoadState {
            connection: *sender,
            state: change.current,
        });

        if change.finished_loading() {
            info!("connection {:?} finished loading", sender);
            self.incoming_events.push_client_load(sender);

            if self.spawner.spawns_on_client_loaded() {
                for participant in self.participants_for_connection(sender) {
                    self.spawn_game_player(&participant)?;
                }
            }
        }

        self.aggregate_load_states()
    }

    fn aggregate_load_states(&mut self) -> Result<(), LobbyServerError> {
        if !self.load_trackers.aggregate() {
            return Ok(());
        }

        let epoch = self.load_trackers.barrier_epoch();
        info!("all clients loaded (epoch {})", epoch);
        self.incoming_events.push_all_loaded(epoch);

        let mut spawned = Ok(());
        if self.spawner.take_bulk_spawn() {
            for participant in self.participants.keys() {
                if let Err(error) = self.spawn_game_player(&participant) {
                    warn!("bulk spawn of {:?} failed: {}", participant, error);
                    if spawned.is_ok() {
                        spawned = Err(error);
                    }
                }
            }
        }

        // the reset runs even when a spawn failed
        for connection in self.load_trackers.reset_all()? {
            self.broadcast(ReplicationUpdate::LoadState {
                connection,
                state: ClientLoadState::Idle,
            });
        }

        // everyone is Idle again, the flag drops until the next full cycle
        self.load_trackers.aggregate();

        spawned
    }

    fn handle_control_binding_failed(
        &mut self,
        sender: &ConnectionId,
        participant: &ParticipantKey,
    ) -> Result<(), LobbyServerError> {
        self.require_admitted(sender)?;

        let Some(record) = self.participants.get(participant) else {
            return Err(LobbyServerError::UnknownParticipant {
                participant: *participant,
            });
        };
        if record.owner() != *sender {
            warn!(
                "connection {:?} tried to remove participant {:?} it does not own",
                sender, participant
            );
            return Err(LobbyServerError::NotParticipantOwner {
                participant: *participant,
                connection: *sender,
            });
        }

        info!(
            "participant {:?} could not bind a control source, removing it",
            participant
        );
        self.despawn_participant(participant)
    }

    fn despawn_participant_internal(
        &mut self,
        participant: &ParticipantKey,
    ) -> Option<LobbyParticipant> {
        let record = self.participants.remove(participant)?;

        if let Some(game_player) = record.game_player() {
            self.despawn_game_player(participant, &game_player);
        }

        self.seats.release_seat(record.index(), participant);

        self.broadcast(ReplicationUpdate::ParticipantDespawned {
            participant: *participant,
        });
        self.incoming_events
            .push_participant_remove(participant, &record.owner());

        info!("removed participant {:?} ({})", participant, record.label());

        Some(record)
    }

    fn despawn_game_player(&mut self, participant: &ParticipantKey, game_player: &GamePlayerKey) {
        if self.game_players.remove(game_player).is_none() {
            return;
        }
        self.broadcast(ReplicationUpdate::GamePlayerDespawned {
            game_player: *game_player,
        });
        self.incoming_events
            .push_game_player_despawn(participant, game_player);
    }
}
