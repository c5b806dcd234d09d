//! Randomized join / leave / load churn. Every settled state must keep the
//! seat invariants and every live replica must agree with the server.

use lobby_client::AutoBind;
use lobby_server::{ServerConfig, SpawnMode};
use lobby_test::{assert_replica_converged, assert_seats_consistent, TestLobby};

const STEPS: usize = 300;
const MAX_CLIENTS: usize = 6;

fn churn(seed: u64, spawn_mode: SpawnMode) {
    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .is_test(true)
        .try_init()
        .ok();

    let rng = fastrand::Rng::with_seed(seed);
    let mut lobby: TestLobby<AutoBind> = TestLobby::new(ServerConfig {
        capacity: 4,
        spawn_mode,
        ..ServerConfig::default()
    });

    for _ in 0..STEPS {
        let clients = lobby.client_ids();
        match rng.usize(0..5) {
            0 if clients.len() < MAX_CLIENTS => {
                lobby.add_client(Default::default(), AutoBind);
            }
            1 if !clients.is_empty() => {
                let connection = clients[rng.usize(0..clients.len())];
                lobby.client_mut(&connection).request_seat();
            }
            2 if !clients.is_empty() => {
                let connection = clients[rng.usize(0..clients.len())];
                lobby.drop_connection(connection);
            }
            3 if !clients.is_empty() => {
                let connection = clients[rng.usize(0..clients.len())];
                if rng.bool() {
                    lobby.client_mut(&connection).load_queue_started();
                } else {
                    lobby.client_mut(&connection).load_queue_ended();
                }
            }
            _ => {}
        }

        // settle only some of the time so requests pile up and race
        if rng.usize(0..3) == 0 {
            lobby.exchange();
            check(&lobby, spawn_mode);
        }
    }

    lobby.exchange();
    check(&lobby, spawn_mode);
}

fn check(lobby: &TestLobby<AutoBind>, spawn_mode: SpawnMode) {
    let server = lobby.server();
    assert_seats_consistent!(server);

    for connection in lobby.client_ids() {
        assert!(server.is_admitted(&connection));
        assert_replica_converged!(server, lobby.client(&connection));
    }
    assert_eq!(server.tracked_connection_count(), lobby.client_ids().len());

    if spawn_mode == SpawnMode::Incremental {
        assert_eq!(server.game_player_count(), server.participant_count());
    }
    for (_, game_player) in server.game_players() {
        let participant = server
            .participant(&game_player.participant())
            .expect("game player outlived its participant");
        assert_eq!(participant.index(), game_player.index());
    }
}

#[test]
fn churn_incremental() {
    for seed in 0..8 {
        churn(seed, SpawnMode::Incremental);
    }
}

#[test]
fn churn_bulk() {
    for seed in 100..108 {
        churn(seed, SpawnMode::Bulk);
    }
}
