pub(crate) mod game_player;
pub(crate) mod lobby_participant;

pub use game_player::*;
pub use lobby_participant::*;
