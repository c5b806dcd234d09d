//! Game player spawning in bulk, incremental and disabled modes, and the
//! participant to game player binding

use lobby_client::{
    AutoBind, GamePlayerAddedEvent, GamePlayerChangedEvent, GamePlayerRemovedEvent,
    ParticipantRemovedEvent,
};
use lobby_server::{
    GamePlayerDespawnedEvent, GamePlayerSpawnedEvent, ParticipantAddedEvent, ServerConfig,
    SpawnMode,
};
use lobby_shared::{GamePlayerKey, ParticipantKey, Placement};
use lobby_test::{assert_replica_converged, assert_seats_consistent, TestLobby};

fn placements() -> Vec<Placement> {
    vec![
        Placement::new([0.0, 0.0, 0.0], 0.0),
        Placement::new([5.0, 0.0, 0.0], 180.0),
    ]
}

fn lobby(spawn_mode: SpawnMode) -> TestLobby<AutoBind> {
    TestLobby::new(ServerConfig {
        capacity: 3,
        placements: placements(),
        spawn_mode,
        ..ServerConfig::default()
    })
}

#[test]
fn bulk_mode_spawns_everyone_when_the_barrier_fires() {
    let mut lobby = lobby(SpawnMode::Bulk);

    let (a, first) = lobby.join_seated();
    let (b, second) = lobby.join_seated();
    assert_eq!(lobby.server().game_player_count(), 0);

    lobby.load(&a);
    assert_eq!(lobby.server().game_player_count(), 0);
    lobby.client_mut(&a).receive();

    lobby.load(&b);
    assert_eq!(lobby.server().game_player_count(), 2);

    for participant in [first, second] {
        let record = lobby.server().participant(&participant).unwrap();
        let game_player = lobby
            .server()
            .game_player(&record.game_player().unwrap())
            .unwrap();
        assert_eq!(game_player.index(), record.index());
        assert_eq!(game_player.owner(), record.owner());
        assert_eq!(game_player.participant(), participant);
        assert_eq!(game_player.placement(), placements()[record.index() % 2]);
    }

    let spawned: Vec<(ParticipantKey, GamePlayerKey)> = lobby
        .server_mut()
        .receive()
        .read::<GamePlayerSpawnedEvent>()
        .collect();
    assert_eq!(spawned.len(), 2);

    // observers hear about the new binding through the change hook
    let mut events = lobby.client_mut(&a).receive();
    let changes: Vec<(ParticipantKey, Option<GamePlayerKey>, Option<GamePlayerKey>)> =
        events.read::<GamePlayerChangedEvent>().collect();
    assert_eq!(changes.len(), 2);
    for (participant, old, new) in changes {
        assert_eq!(old, None);
        assert_eq!(new, lobby.server().participant(&participant).unwrap().game_player());
    }
    assert_eq!(events.read::<GamePlayerAddedEvent>().count(), 2);

    assert_replica_converged!(lobby.server(), lobby.client(&a));
    assert_replica_converged!(lobby.server(), lobby.client(&b));
}

#[test]
fn bulk_mode_spawns_late_joiners_immediately() {
    let mut lobby = lobby(SpawnMode::Bulk);

    let (a, _) = lobby.join_seated();
    lobby.load(&a);
    assert_eq!(lobby.server().game_player_count(), 1);

    let (_, late) = lobby.join_seated();
    assert!(lobby.server().participant(&late).unwrap().game_player().is_some());
    assert_eq!(lobby.server().game_player_count(), 2);

    // the next barrier sees everyone bound already
    lobby.load(&a);
    assert_eq!(lobby.server().game_player_count(), 2);
}

#[test]
fn incremental_mode_spawns_as_participants_arrive() {
    let mut lobby = lobby(SpawnMode::Incremental);

    let (a, participant) = lobby.join_seated();
    let game_player = lobby
        .server()
        .participant(&participant)
        .unwrap()
        .game_player()
        .expect("spawned on arrival");

    assert_eq!(
        lobby.server_mut().spawn_game_player(&participant),
        Ok(None)
    );
    lobby.load(&a);
    assert_eq!(lobby.server().game_player_count(), 1);
    assert_eq!(
        lobby.client(&a).participant(&participant).unwrap().game_player(),
        Some(game_player)
    );
}

#[test]
fn spawning_disabled_keeps_everyone_in_the_lobby() {
    let mut lobby = lobby(SpawnMode::None);

    let (a, _) = lobby.join_seated();
    let (b, _) = lobby.join_seated();
    lobby.load(&a);
    lobby.load(&b);

    assert_eq!(lobby.server().barrier_epoch(), 1);
    assert_eq!(lobby.server().game_player_count(), 0);

    // a scene change into incremental spawning catches everyone up
    lobby
        .server_mut()
        .set_spawn_mode(SpawnMode::Incremental)
        .unwrap();
    lobby.exchange();
    assert_eq!(lobby.server().game_player_count(), 2);
    assert_replica_converged!(lobby.server(), lobby.client(&a));
}

#[test]
fn switching_back_to_bulk_rearms_the_spawn() {
    let mut lobby = lobby(SpawnMode::None);

    let (a, _) = lobby.join_seated();
    lobby.load(&a);
    assert_eq!(lobby.server().game_player_count(), 0);

    lobby.server_mut().set_spawn_mode(SpawnMode::Bulk).unwrap();
    let (b, _) = lobby.join_seated();
    assert_eq!(lobby.server().game_player_count(), 0);

    lobby.load(&a);
    lobby.load(&b);
    assert_eq!(lobby.server().game_player_count(), 2);
}

#[test]
fn placements_wrap_around_the_pool() {
    let mut lobby = lobby(SpawnMode::Incremental);

    let seated: Vec<ParticipantKey> = (0..3).map(|_| lobby.join_seated().1).collect();

    let placement_of = |participant: &ParticipantKey| {
        let server = lobby.server();
        let game_player = server.participant(participant).unwrap().game_player().unwrap();
        server.game_player(&game_player).unwrap().placement()
    };
    assert_eq!(placement_of(&seated[0]), placements()[0]);
    assert_eq!(placement_of(&seated[1]), placements()[1]);
    assert_eq!(placement_of(&seated[2]), placements()[0]);
}

#[test]
fn despawning_a_participant_destroys_its_game_player() {
    let mut lobby = lobby(SpawnMode::Incremental);

    let (a, participant) = lobby.join_seated();
    let (b, _) = lobby.join_seated();
    let game_player = lobby
        .server()
        .participant(&participant)
        .unwrap()
        .game_player()
        .unwrap();
    lobby.server_mut().receive();
    lobby.client_mut(&b).receive();

    lobby.server_mut().despawn_participant(&participant).unwrap();
    lobby.exchange();

    assert!(lobby.server().game_player(&game_player).is_none());
    assert_eq!(lobby.server().seat(0), None);
    assert!(lobby.participants_of(&a).is_empty());

    let despawned: Vec<(ParticipantKey, GamePlayerKey)> = lobby
        .server_mut()
        .receive()
        .read::<GamePlayerDespawnedEvent>()
        .collect();
    assert_eq!(despawned, vec![(participant, game_player)]);

    let mut events = lobby.client_mut(&b).receive();
    let removed_players: Vec<GamePlayerKey> = events.read::<GamePlayerRemovedEvent>().collect();
    assert_eq!(removed_players, vec![game_player]);
    let removed: Vec<ParticipantKey> = events.read::<ParticipantRemovedEvent>().collect();
    assert_eq!(removed, vec![participant]);

    assert_seats_consistent!(lobby.server());
    assert_replica_converged!(lobby.server(), lobby.client(&b));
}

#[test]
fn shutdown_clears_the_session() {
    let mut lobby = lobby(SpawnMode::Incremental);

    let (a, _) = lobby.join_seated();
    let (b, _) = lobby.join_seated();
    lobby.server_mut().shutdown();
    lobby.exchange();

    assert!(!lobby.has_client(&a));
    assert!(!lobby.has_client(&b));
    assert_eq!(lobby.departed(&a).participant_count(), 0);
    assert_eq!(lobby.departed(&a).game_player_count(), 0);
    assert_eq!(lobby.server().participant_count(), 0);
    assert_eq!(lobby.server().game_player_count(), 0);
    assert_eq!(lobby.server().occupied_count(), 0);
    assert_eq!(lobby.server().tracked_connection_count(), 0);
    assert!(lobby.server().admitted_connections().is_empty());

    // a fresh session starts from seat zero
    lobby.server_mut().receive();
    let (_, participant) = lobby.join_seated();
    assert_eq!(lobby.server().participant(&participant).unwrap().index(), 0);
    let added: Vec<ParticipantKey> = lobby
        .server_mut()
        .receive()
        .read::<ParticipantAddedEvent>()
        .collect();
    assert_eq!(added, vec![participant]);
}
