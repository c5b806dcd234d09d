mod lobby_server;
pub use lobby_server::LobbyServer;

mod server_config;
pub use server_config::ServerConfig;
