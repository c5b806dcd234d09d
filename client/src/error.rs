use thiserror::Error;

use lobby_shared::{ConnectionId, GamePlayerKey, ParticipantKey, ReplicatedError};

/// Errors raised while applying replicated state received from the Server
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LobbyClientError {
    /// An update named a participant this replica has never seen
    #[error("Participant {participant:?} is not replicated here")]
    UnknownParticipant { participant: ParticipantKey },

    /// An update named a game player this replica has never seen
    #[error("Game player {game_player:?} is not replicated here")]
    UnknownGamePlayer { game_player: GamePlayerKey },

    /// An update named a load tracker this replica has never seen
    #[error("No load tracker replicated for connection {connection:?}")]
    UnknownTracker { connection: ConnectionId },

    #[error("Participant {participant:?} was spawned twice")]
    DuplicateParticipant { participant: ParticipantKey },

    #[error("Game player {game_player:?} was spawned twice")]
    DuplicateGamePlayer { game_player: GamePlayerKey },

    #[error("Load tracker for connection {connection:?} was spawned twice")]
    DuplicateTracker { connection: ConnectionId },

    #[error(transparent)]
    Replicated(#[from] ReplicatedError),
}
