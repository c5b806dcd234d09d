use lobby_shared::{
    participant_label, ConnectionId, GamePlayerKey, Replicated, ReplicatedError,
};

/// The Server's record of one seated participant. Owns the reference to its
/// game player and is the only thing allowed to destroy it.
pub struct LobbyParticipant {
    owner: ConnectionId,
    index: Replicated<usize>,
    game_player: Replicated<Option<GamePlayerKey>>,
    label: String,
}

impl LobbyParticipant {
    pub(crate) fn new(owner: ConnectionId, index: usize) -> Self {
        Self {
            owner,
            index: Replicated::host_owned(index),
            game_player: Replicated::host_owned(None),
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

    pub fn has_game_player(&self) -> bool {
        self.game_player.is_some()
    }

    /// Returns the previous index if it changed
    pub(crate) fn set_index(&mut self, index: usize) -> Result<Option<usize>, ReplicatedError> {
        let previous = *self.index;
        if !self.index.set(index)? {
            return Ok(None);
        }
        self.label = participant_label(index);
        Ok(Some(previous))
    }

    pub(crate) fn bind_game_player(
        &mut self,
        game_player: Option<GamePlayerKey>,
    ) -> Result<bool, ReplicatedError> {
        self.game_player.set(game_player)
    }
}
