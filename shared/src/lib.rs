//! # Lobby Shared
//! Common functionality shared between lobby-server & lobby-client crates.

#![deny(trivial_numeric_casts, unstable_features, unused_import_braces)]

mod bigmap;
mod load_state;
mod messages;
mod replicated;
mod seat_table;
mod types;

pub use bigmap::{BigMap, BigMapIter, BigMapKey};
pub use load_state::{ClientLoadState, LoadBarrier};
pub use messages::{ClientMessage, ReplicationUpdate, ServerMessage};
pub use replicated::{Change, Replicated, ReplicatedError};
pub use seat_table::SeatTable;
pub use types::{
    participant_label, ConnectionId, GamePlayerKey, HostType, ParticipantKey, Placement,
};
