use std::{mem, vec::IntoIter};

use lobby_shared::{ConnectionId, GamePlayerKey, ParticipantKey};

use crate::LobbyServerError;

pub struct LobbyEvents {
    admissions: Vec<(ConnectionId, bool)>,
    disconnections: Vec<ConnectionId>,
    seat_grant_failures: Vec<ConnectionId>,
    participant_adds: Vec<ParticipantKey>,
    participant_removes: Vec<(ParticipantKey, ConnectionId)>,
    client_loads: Vec<ConnectionId>,
    all_loads: Vec<u64>,
    game_player_spawns: Vec<(ParticipantKey, GamePlayerKey)>,
    game_player_despawns: Vec<(ParticipantKey, GamePlayerKey)>,
    errors: Vec<LobbyServerError>,

    empty: bool,
}

impl Default for LobbyEvents {
    fn default() -> Self {
        Self::new()
    }
}

impl LobbyEvents {
    pub(crate) fn new() -> Self {
        Self {
            admissions: Vec::new(),
            disconnections: Vec::new(),
            seat_grant_failures: Vec::new(),
            participant_adds: Vec::new(),
            participant_removes: Vec::new(),
            client_loads: Vec::new(),
            all_loads: Vec::new(),
            game_player_spawns: Vec::new(),
            game_player_despawns: Vec::new(),
            errors: Vec::new(),

            empty: true,
        }
    }

    // Public

    pub fn is_empty(&self) -> bool {
        self.empty
    }

    pub fn read<V: LobbyEvent>(&mut self) -> V::Iter {
        V::iter(self)
    }

    pub fn has<V: LobbyEvent>(&self) -> bool {
        V::has(self)
    }

    // Crate-public

    pub(crate) fn push_admission(&mut self, connection: &ConnectionId, admitted: bool) {
        self.admissions.push((*connection, admitted));
        self.empty = false;
    }

    pub(crate) fn push_disconnection(&mut self, connection: &ConnectionId) {
        self.disconnections.push(*connection);
        self.empty = false;
    }

    pub(crate) fn push_seat_grant_failure(&mut self, connection: &ConnectionId) {
        self.seat_grant_failures.push(*connection);
        self.empty = false;
    }

    pub(crate) fn push_participant_add(&mut self, participant: &ParticipantKey) {
        self.participant_adds.push(*participant);
        self.empty = false;
    }

    pub(crate) fn push_participant_remove(
        &mut self,
        participant: &ParticipantKey,
        owner: &ConnectionId,
    ) {
        self.participant_removes.push((*participant, *owner));
        self.empty = false;
    }

    pub(crate) fn push_client_load(&mut self, connection: &ConnectionId) {
        self.client_loads.push(*connection);
        self.empty = false;
    }

    pub(crate) fn push_all_loaded(&mut self, epoch: u64) {
        self.all_loads.push(epoch);
        self.empty = false;
    }

    pub(crate) fn push_game_player_spawn(
        &mut self,
        participant: &ParticipantKey,
        game_player: &GamePlayerKey,
    ) {
        self.game_player_spawns.push((*participant, *game_player));
        self.empty = false;
    }

    pub(crate) fn push_game_player_despawn(
        &mut self,
        participant: &ParticipantKey,
        game_player: &GamePlayerKey,
    ) {
        self.game_player_despawns.push((*participant, *game_player));
        self.empty = false;
    }

    pub(crate) fn push_error(&mut self, error: LobbyServerError) {
        self.errors.push(error);
        self.empty = false;
    }
}

// Event Trait
pub trait LobbyEvent {
    type Iter;

    fn iter(events: &mut LobbyEvents) -> Self::Iter;

    fn has(events: &LobbyEvents) -> bool;
}

macro_rules! lobby_event {
    ($(#[$meta:meta])* $name:ident, $field:ident, $item:ty) => {
        $(#[$meta])*
        pub struct $name;
        impl LobbyEvent for $name {
            type Iter = IntoIter<$item>;

            fn iter(events: &mut LobbyEvents) -> Self::Iter {
                let list = mem::take(&mut events.$field);
                IntoIterator::into_iter(list)
            }

            fn has(events: &LobbyEvents) -> bool {
                !events.$field.is_empty()
            }
        }
    };
}

lobby_event!(
    /// `(connection, admitted)` for every decided admission, the host included
    AdmissionEvent, admissions, (ConnectionId, bool)
);
lobby_event!(DisconnectEvent, disconnections, ConnectionId);
lobby_event!(
    /// A seat request was refused. Only the requester is told.
    SeatGrantFailedEvent, seat_grant_failures, ConnectionId
);
lobby_event!(ParticipantAddedEvent, participant_adds, ParticipantKey);
lobby_event!(
    /// `(participant, owner)`
    ParticipantRemovedEvent, participant_removes, (ParticipantKey, ConnectionId)
);
lobby_event!(
    /// A connection went `Loading -> Loaded`
    ClientLoadedEvent, client_loads, ConnectionId
);
lobby_event!(
    /// The barrier fired. Carries the barrier epoch, starting at 1.
    AllClientsLoadedEvent, all_loads, u64
);
lobby_event!(GamePlayerSpawnedEvent, game_player_spawns, (ParticipantKey, GamePlayerKey));
lobby_event!(GamePlayerDespawnedEvent, game_player_despawns, (ParticipantKey, GamePlayerKey));
lobby_event!(ErrorEvent, errors, LobbyServerError);
