use lobby_shared::Placement;

/// When game players are created for lobby participants
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SpawnMode {
    /// No game players, e.g. while everyone sits in the lobby scene
    None,
    /// Each participant gets its game player as soon as it is added and
    /// again whenever its connection finishes loading, before any barrier
    Incremental,
    /// Every participant gets its game player at once when the
    /// all-clients-loaded barrier fires
    Bulk,
}

/// Spawn policy plus the placement pool. The create-and-bind procedure
/// itself lives on [`LobbyServer`](crate::LobbyServer), shared by both modes.
pub struct Spawner {
    mode: SpawnMode,
    placements: Vec<Placement>,
    bulk_spawned: bool,
}

impl Spawner {
    /// `placements` must not be empty, `ServerConfig::validate` checks this
    pub fn new(mode: SpawnMode, placements: Vec<Placement>) -> Self {
        Self {
            mode,
            placements,
            bulk_spawned: false,
        }
    }

    pub fn mode(&self) -> SpawnMode {
        self.mode
    }

    /// Switching modes models a scene change and re-arms the bulk spawn
    pub fn set_mode(&mut self, mode: SpawnMode) {
        self.mode = mode;
        self.bulk_spawned = false;
    }

    pub fn bulk_spawned(&self) -> bool {
        self.bulk_spawned
    }

    /// Placement pool wraps around when there are more seats than placements
    pub fn placement_for(&self, index: usize) -> Placement {
        self.placements[index % self.placements.len()]
    }

    pub fn spawns_on_participant_added(&self) -> bool {
        match self.mode {
            SpawnMode::None => false,
            SpawnMode::Incremental => true,
            // joined after everyone else already got their game player
            SpawnMode::Bulk => self.bulk_spawned,
        }
    }

    pub fn spawns_on_client_loaded(&self) -> bool {
        self.mode == SpawnMode::Incremental
    }

    /// One-shot: true the first time the barrier fires in `Bulk` mode
    pub fn take_bulk_spawn(&mut self) -> bool {
        if self.mode != SpawnMode::Bulk || self.bulk_spawned {
            return false;
        }
        self.bulk_spawned = true;
        true
    }
}
