//! # Lobby Client
//! An observer of a lobby session. Holds read-only replicas of the lobby's
//! participants, game players and load trackers, delivers their changes as
//! typed events, and routes every write to the authority as a request.

#![deny(
    trivial_casts,
    trivial_numeric_casts,
    unstable_features,
    unused_import_braces
)]

pub mod shared {
    pub use lobby_shared::{
        ClientLoadState, ClientMessage, ConnectionId, GamePlayerKey, ParticipantKey, Placement,
        ReplicationUpdate, SeatTable, ServerMessage,
    };
}

mod client;
mod client_config;
mod control;
mod error;
mod events;
mod replica;
mod transport;

pub use client::LobbyClient;
pub use client_config::ClientConfig;
pub use control::{AutoBind, ControlSource, DeviceQueue};
pub use error::LobbyClientError;
pub use events::{
    AdmissionResultEvent, AllClientsLoadedEvent, ClientEvent, ClientEvents, ClientLoadedEvent,
    ErrorEvent, GamePlayerAddedEvent, GamePlayerChangedEvent, GamePlayerRemovedEvent,
    ParticipantAddedEvent, ParticipantIndexChangedEvent, ParticipantRemovedEvent,
    SeatGrantFailedEvent,
};
pub use replica::{GamePlayerReplica, ParticipantReplica};
pub use transport::ClientTransport;
