use lobby_shared::{ConnectionId, ParticipantKey, Placement, Replicated, ReplicatedError};

/// Gameplay-phase counterpart of a [`LobbyParticipant`](crate::LobbyParticipant),
/// carrying the same seat index
pub struct GamePlayer {
    owner: ConnectionId,
    participant: ParticipantKey,
    index: Replicated<usize>,
    placement: Placement,
}

impl GamePlayer {
    pub(crate) fn new(
        owner: ConnectionId,
        participant: ParticipantKey,
        index: usize,
        placement: Placement,
    ) -> Self {
        Self {
            owner,
            participant,
            index: Replicated::host_owned(index),
            placement,
        }
    }

    pub fn owner(&self) -> ConnectionId {
        self.owner
    }

    pub fn participant(&self) -> ParticipantKey {
        self.participant
    }

    pub fn index(&self) -> usize {
        *self.index
    }

    pub fn placement(&self) -> Placement {
        self.placement
    }

    pub(crate) fn set_index(&mut self, index: usize) -> Result<bool, ReplicatedError> {
        self.index.set(index)
    }
}
