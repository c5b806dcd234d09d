use std::{mem, vec::IntoIter};

use lobby_shared::{ConnectionId, GamePlayerKey, ParticipantKey};

use crate::LobbyClientError;

/// The change hooks of every replicated value, collected until the next
/// `LobbyClient::receive()`
pub struct ClientEvents {
    admission_results: Vec<bool>,
    seat_grant_failures: Vec<ConnectionId>,
    participant_adds: Vec<ParticipantKey>,
    participant_removes: Vec<ParticipantKey>,
    participant_index_changes: Vec<(ParticipantKey, usize, usize)>,
    game_player_changes: Vec<(ParticipantKey, Option<GamePlayerKey>, Option<GamePlayerKey>)>,
    game_player_adds: Vec<GamePlayerKey>,
    game_player_removes: Vec<GamePlayerKey>,
    client_loads: Vec<ConnectionId>,
    all_loads: Vec<u64>,
    errors: Vec<LobbyClientError>,

    empty: bool,
}

impl Default for ClientEvents {
    fn default() -> Self {
        Self::new()
    }
}

impl ClientEvents {
    pub(crate) fn new() -> Self {
        Self {
            admission_results: Vec::new(),
            seat_grant_failures: Vec::new(),
            participant_adds: Vec::new(),
            participant_removes: Vec::new(),
            participant_index_changes: Vec::new(),
            game_player_changes: Vec::new(),
            game_player_adds: Vec::new(),
            game_player_removes: Vec::new(),
            client_loads: Vec::new(),
            all_loads: Vec::new(),
            errors: Vec::new(),

            empty: true,
        }
    }

    // Public

    pub fn is_empty(&self) -> bool {
        self.empty
    }

    pub fn read<V: ClientEvent>(&mut self) -> V::Iter {
        V::iter(self)
    }

    pub fn has<V: ClientEvent>(&self) -> bool {
        V::has(self)
    }

    // Crate-public

    pub(crate) fn push_admission_result(&mut self, admitted: bool) {
        self.admission_results.push(admitted);
        self.empty = false;
    }

    pub(crate) fn push_seat_grant_failure(&mut self, requested_by: &ConnectionId) {
        self.seat_grant_failures.push(*requested_by);
        self.empty = false;
    }

    pub(crate) fn push_participant_add(&mut self, participant: &ParticipantKey) {
        self.participant_adds.push(*participant);
        self.empty = false;
    }

    pub(crate) fn push_participant_remove(&mut self, participant: &ParticipantKey) {
        self.participant_removes.push(*participant);
        self.empty = false;
    }

    pub(crate) fn push_participant_index_change(
        &mut self,
        participant: &ParticipantKey,
        old: usize,
        new: usize,
    ) {
        self.participant_index_changes.push((*participant, old, new));
        self.empty = false;
    }

    pub(crate) fn push_game_player_change(
        &mut self,
        participant: &ParticipantKey,
        old: Option<GamePlayerKey>,
        new: Option<GamePlayerKey>,
    ) {
        self.game_player_changes.push((*participant, old, new));
        self.empty = false;
    }

    pub(crate) fn push_game_player_add(&mut self, game_player: &GamePlayerKey) {
        self.game_player_adds.push(*game_player);
        self.empty = false;
    }

    pub(crate) fn push_game_player_remove(&mut self, game_player: &GamePlayerKey) {
        self.game_player_removes.push(*game_player);
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

    pub(crate) fn push_error(&mut self, error: LobbyClientError) {
        self.errors.push(error);
        self.empty = false;
    }
}

// Event Trait
pub trait ClientEvent {
    type Iter;

    fn iter(events: &mut ClientEvents) -> Self::Iter;

    fn has(events: &ClientEvents) -> bool;
}

macro_rules! client_event {
    ($(#[$meta:meta])* $name:ident, $field:ident, $item:ty) => {
        $(#[$meta])*
        pub struct $name;
        impl ClientEvent for $name {
            type Iter = IntoIter<$item>;

            fn iter(events: &mut ClientEvents) -> Self::Iter {
                let list = mem::take(&mut events.$field);
                IntoIterator::into_iter(list)
            }

            fn has(events: &ClientEvents) -> bool {
                !events.$field.is_empty()
            }
        }
    };
}

client_event!(AdmissionResultEvent, admission_results, bool);
client_event!(
    /// A seat grant for this connection was refused. Carries the requester.
    SeatGrantFailedEvent, seat_grant_failures, ConnectionId
);
client_event!(ParticipantAddedEvent, participant_adds, ParticipantKey);
client_event!(ParticipantRemovedEvent, participant_removes, ParticipantKey);
client_event!(
    /// `(participant, old index, new index)`
    ParticipantIndexChangedEvent, participant_index_changes, (ParticipantKey, usize, usize)
);
client_event!(
    /// The participant's bound game player changed: `(participant, old, new)`
    GamePlayerChangedEvent,
    game_player_changes,
    (ParticipantKey, Option<GamePlayerKey>, Option<GamePlayerKey>)
);
client_event!(GamePlayerAddedEvent, game_player_adds, GamePlayerKey);
client_event!(GamePlayerRemovedEvent, game_player_removes, GamePlayerKey);
client_event!(ClientLoadedEvent, client_loads, ConnectionId);
client_event!(
    /// This replica's view of the barrier fired. Carries the local epoch.
    AllClientsLoadedEvent, all_loads, u64
);
client_event!(ErrorEvent, errors, LobbyClientError);
