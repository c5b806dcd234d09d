//! # Lobby Server
//! The authority side of a multiplayer lobby: admits connections, hands out
//! seats, tracks every connection's scene load progress and spawns gameplay
//! avatars for seated participants. Replicated state is pushed to observers
//! through a [`ServerTransport`].

#![deny(
    trivial_casts,
    trivial_numeric_casts,
    unstable_features,
    unused_import_braces
)]

pub mod shared {
    pub use lobby_shared::{
        BigMap, BigMapKey, ClientLoadState, ClientMessage, ConnectionId, GamePlayerKey,
        ParticipantKey, Placement, ReplicationUpdate, SeatTable, ServerMessage,
    };
}

mod admission;
mod error;
mod events;
mod load_tracker;
mod participant;
mod seats;
mod server;
mod spawner;
mod transport;

pub use admission::{
    AdmissionGate, AdmissionStatus, ConnectionOrigin, CredentialSource, HostPassword,
};
pub use error::{ConfigError, LobbyServerError};
pub use events::{
    AdmissionEvent, AllClientsLoadedEvent, ClientLoadedEvent, DisconnectEvent, ErrorEvent,
    GamePlayerDespawnedEvent, GamePlayerSpawnedEvent, LobbyEvent, LobbyEvents,
    ParticipantAddedEvent, ParticipantRemovedEvent, SeatGrantFailedEvent,
};
pub use load_tracker::{ConnectionLoadTracker, LoadStateChange, LoadTrackers};
pub use participant::{GamePlayer, LobbyParticipant};
pub use seats::SlotAllocator;
pub use server::{LobbyServer, ServerConfig};
pub use spawner::{SpawnMode, Spawner};
pub use transport::ServerTransport;
