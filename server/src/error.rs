use thiserror::Error;

use lobby_shared::{ClientLoadState, ConnectionId, ParticipantKey, ReplicatedError};

/// Errors raised by the lobby authority
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LobbyServerError {
    /// The connection was never registered with `connect()`, or has left
    #[error("Connection {connection:?} is not known to the lobby")]
    UnknownConnection { connection: ConnectionId },

    /// The connection sent a request before being admitted
    #[error("Connection {connection:?} has not been admitted to the lobby")]
    NotAdmitted { connection: ConnectionId },

    /// An already-admitted connection asked for admission again
    #[error("Connection {connection:?} requested admission twice")]
    DuplicateAdmission { connection: ConnectionId },

    /// An unreserved seat request arrived while the lobby was full
    #[error("Lobby is full, no seat for connection {connection:?}")]
    LobbyFull { connection: ConnectionId },

    /// The seat scan found no empty index
    #[error("No empty seat left for connection {connection:?}")]
    NoEmptySeat { connection: ConnectionId },

    /// The participant does not exist, or has already been despawned
    #[error("Participant {participant:?} does not exist")]
    UnknownParticipant { participant: ParticipantKey },

    /// A request about a participant came from a connection that does not own it
    #[error("Connection {connection:?} does not own participant {participant:?}")]
    NotParticipantOwner {
        participant: ParticipantKey,
        connection: ConnectionId,
    },

    /// Seat index is outside the seat table
    #[error("Seat {index} is out of range for a lobby of capacity {capacity}")]
    SeatOutOfRange { index: usize, capacity: usize },

    /// Seat already holds another participant
    #[error("Seat {index} is already occupied")]
    SeatOccupied { index: usize },

    /// The connection has no load tracker (not admitted, or already gone)
    #[error("Connection {connection:?} has no load tracker")]
    NoLoadTracker { connection: ConnectionId },

    /// Observers may not move their own tracker into this state
    #[error("Cannot transition load state {from} -> {to} on request")]
    InvalidLoadTransition { from: &'static str, to: &'static str },

    #[error(transparent)]
    Replicated(#[from] ReplicatedError),
}

impl LobbyServerError {
    pub(crate) fn invalid_load_transition(from: ClientLoadState, to: ClientLoadState) -> Self {
        LobbyServerError::InvalidLoadTransition {
            from: from.name(),
            to: to.name(),
        }
    }
}

/// Errors in a [`ServerConfig`](crate::ServerConfig)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A lobby must have at least one seat
    #[error("Lobby capacity must be at least 1")]
    ZeroCapacity,

    /// Spawning needs at least one placement to wrap around
    #[error("Placement pool must not be empty")]
    NoPlacements,
}
