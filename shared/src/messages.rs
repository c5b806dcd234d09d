use crate::{ClientLoadState, ConnectionId, GamePlayerKey, ParticipantKey, Placement};

/// Requests sent from a Client to the Server. The Server validates every
/// one of these before acting on it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ClientMessage {
    /// Ask for admission. Carries the host password when the session has one.
    AdmissionRequest { credential: Option<String> },
    /// Ask for a seat. `None` means "for the sending connection".
    SeatRequest { connection: Option<ConnectionId> },
    /// Report the sender's own scene-load progress
    LoadState(ClientLoadState),
    /// The sender could not bind a control source to its participant
    ControlBindingFailed(ParticipantKey),
}

/// Messages sent from the Server to a Client
#[derive(Clone, Debug, PartialEq)]
pub enum ServerMessage {
    AdmissionResult { admitted: bool },
    /// A seat grant for the receiving connection was refused. `requested_by`
    /// is the connection whose request failed.
    SeatGrantFailed { requested_by: ConnectionId },
    Replication(ReplicationUpdate),
}

/// One authority-side change pushed to observers
#[derive(Clone, Debug, PartialEq)]
pub enum ReplicationUpdate {
    LobbyInfo {
        capacity: usize,
        /// Times the all-loaded barrier has fired so far
        barrier_epoch: u64,
    },
    ParticipantSpawned {
        participant: ParticipantKey,
        owner: ConnectionId,
        index: usize,
        game_player: Option<GamePlayerKey>,
    },
    ParticipantIndex {
        participant: ParticipantKey,
        index: usize,
    },
    ParticipantBound {
        participant: ParticipantKey,
        game_player: Option<GamePlayerKey>,
    },
    ParticipantDespawned {
        participant: ParticipantKey,
    },
    GamePlayerSpawned {
        game_player: GamePlayerKey,
        owner: ConnectionId,
        index: usize,
        placement: Placement,
    },
    GamePlayerIndex {
        game_player: GamePlayerKey,
        index: usize,
    },
    GamePlayerDespawned {
        game_player: GamePlayerKey,
    },
    TrackerSpawned {
        connection: ConnectionId,
        state: ClientLoadState,
    },
    LoadState {
        connection: ConnectionId,
        state: ClientLoadState,
    },
    TrackerDespawned {
        connection: ConnectionId,
    },
}

impl From<ReplicationUpdate> for ServerMessage {
    fn from(update: ReplicationUpdate) -> Self {
        ServerMessage::Replication(update)
    }
}
