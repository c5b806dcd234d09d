use crate::BigMapKey;

/// Which side of the session a value lives on. The Server is the authority,
/// Clients only observe.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HostType {
    Server,
    Client,
}

/// Identity of one transport-level connection, handed out by the network
/// collaborator and stable for the connection's lifetime
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

// ParticipantKey
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ParticipantKey(u64);

impl BigMapKey for ParticipantKey {
    fn to_u64(&self) -> u64 {
        self.0
    }

    fn from_u64(value: u64) -> Self {
        ParticipantKey(value)
    }
}

// GamePlayerKey
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GamePlayerKey(u64);

impl BigMapKey for GamePlayerKey {
    fn to_u64(&self) -> u64 {
        self.0
    }

    fn from_u64(value: u64) -> Self {
        GamePlayerKey(value)
    }
}

/// Where a game player is placed when it is spawned
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct Placement {
    pub position: [f32; 3],
    pub yaw: f32,
}

impl Placement {
    pub fn new(position: [f32; 3], yaw: f32) -> Self {
        Self { position, yaw }
    }
}

/// Display label of a lobby participant occupying the given seat
pub fn participant_label(index: usize) -> String {
    format!("Player_{}", index)
}
