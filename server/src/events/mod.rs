pub(crate) mod lobby_events;

pub use lobby_events::*;
