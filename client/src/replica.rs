use lobby_shared::{
    participant_label, Change, ConnectionId, GamePlayerKey, HostType, ParticipantKey, Placement,
    Replicated, ReplicatedError,
};

/// Read-only copy of a lobby participant
pub struct ParticipantReplica {
    owner: ConnectionId,
    index: Replicated<usize>,
    game_player: Replicated<Option<GamePlayerKey>>,
    label: String,
}

impl ParticipantReplica {
    pub(crate) fn new(
        owner: ConnectionId,
        index: usize,
        game_player: Option<GamePlayerKey>,
    ) -> Self {
        Self {
            owner,
            index: Replicated::new(HostType::Client, index),
            game_player: Replicated::new(HostType::Client, game_player),
            label: participant_label(index),
        }
    }

    pub fn owner(&self) -> ConnectionId {
        self.owner
    }

    pub fn index(&self) -> usize {
        *self.index
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn game_player(&self) -> Option<GamePlayerKey> {
        *self.game_player
    }

    pub(crate) fn mirror_index(
        &mut self,
        index: usize,
    ) -> Result<Option<Change<usize>>, ReplicatedError> {
        let change = self.index.mirror(index)?;
        if change.is_some() {
            self.label = participant_label(index);
        }
        Ok(change)
    }

    pub(crate) fn mirror_game_player(
        &mut self,
        game_player: Option<GamePlayerKey>,
    ) -> Result<Option<Change<Option<GamePlayerKey>>>, ReplicatedError> {
        self.game_player.mirror(game_player)
    }
}

/// Read-only copy of a game player
pub struct GamePlayerReplica {
    owner: ConnectionId,
    index: Replicated<usize>,
    placement: Placement,
}

impl GamePlayerReplica {
    pub(crate) fn new(owner: ConnectionId, index: usize, placement: Placement) -> Self {
        Self {
            owner,
            index: Replicated::new(HostType::Client, index),
            placement,
        }
    }

    pub fn owner(&self) -> ConnectionId {
        self.owner
    }

    pub fn index(&self) -> usize {
        *self.index
    }

    pub fn placement(&self) -> Placement {
        self.placement
    }

    pub(crate) fn mirror_index(
        &mut self,
        index: usize,
    ) -> Result<Option<Change<usize>>, ReplicatedError> {
        self.index.mirror(index)
    }
}
