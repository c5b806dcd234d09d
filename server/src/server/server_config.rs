use std::default::Default;

use lobby_shared::Placement;

use crate::{spawner::SpawnMode, ConfigError};

/// Contains Config properties which will be used by the Server
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Number of seats in the lobby
    pub capacity: usize,
    /// Pool of game player placements, indexed by seat modulo its length
    pub placements: Vec<Placement>,
    /// How game players are spawned for lobby participants
    pub spawn_mode: SpawnMode,
    /// When set, every non-host connection must present this password to be
    /// admitted
    pub host_password: Option<String>,
}

impl ServerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        if self.placements.is_empty() {
            return Err(ConfigError::NoPlacements);
        }
        Ok(())
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            capacity: 4,
            placements: vec![Placement::default()],
            spawn_mode: SpawnMode::Bulk,
            host_password: None,
        }
    }
}
