//! Slot allocation: lowest-empty-first grants, targeted failures, relocation
//! and the seat uniqueness properties

use std::collections::BTreeMap;

use proptest::prelude::*;

use lobby_client::{AutoBind, ParticipantIndexChangedEvent};
use lobby_server::{
    AdmissionGate, ConnectionOrigin, LobbyServer, LobbyServerError, SeatGrantFailedEvent,
    ServerConfig, SlotAllocator, SpawnMode,
};
use lobby_shared::{BigMapKey, ConnectionId, ParticipantKey};
use lobby_test::{assert_replica_converged, assert_seats_consistent, TestLobby};

fn lobby(capacity: usize, spawn_mode: SpawnMode) -> TestLobby<AutoBind> {
    TestLobby::new(ServerConfig {
        capacity,
        spawn_mode,
        ..ServerConfig::default()
    })
}

#[test]
fn vacated_seat_is_granted_to_the_next_connection() {
    let mut lobby = lobby(1, SpawnMode::Incremental);

    let (a, participant_a) = lobby.join_seated();
    let record = lobby.server().participant(&participant_a).unwrap();
    assert_eq!(record.index(), 0);
    let game_player = record.game_player().expect("incremental mode binds at once");
    assert_eq!(lobby.server().game_player(&game_player).unwrap().index(), 0);

    lobby.drop_connection(a);
    lobby.exchange();

    assert_eq!(lobby.server().seat(0), None);
    assert!(lobby.server().game_player(&game_player).is_none());
    assert_eq!(lobby.server().participant_count(), 0);
    assert_eq!(lobby.server().game_player_count(), 0);

    let b = lobby.join_remote();
    assert!(lobby.client(&b).is_admitted());
    lobby.request_seat(&b);

    let participant_b = lobby.participants_of(&b)[0];
    assert_eq!(lobby.server().participant(&participant_b).unwrap().index(), 0);
    assert_seats_consistent!(lobby.server());
    assert_replica_converged!(lobby.server(), lobby.client(&b));
}

#[test]
fn seats_fill_lowest_index_first() {
    let mut lobby = lobby(4, SpawnMode::None);

    let (_, first) = lobby.join_seated();
    let (b, second) = lobby.join_seated();
    let (_, third) = lobby.join_seated();

    lobby.drop_connection(b);
    lobby.exchange();
    assert!(lobby.server().participant(&second).is_none());

    let (_, fourth) = lobby.join_seated();

    let index = |key: &ParticipantKey| lobby.server().participant(key).unwrap().index();
    assert_eq!(index(&first), 0);
    assert_eq!(index(&third), 2);
    assert_eq!(index(&fourth), 1);
    assert_eq!(lobby.server().participant(&fourth).unwrap().label(), "Player_1");
}

#[test]
fn seat_grant_failure_is_only_told_to_the_target() {
    let mut lobby = lobby(2, SpawnMode::None);

    let (a, _) = lobby.join_seated();
    let b = lobby.join_remote();
    for connection in [a, b] {
        lobby.client_mut(&connection).receive();
    }

    // A holds no reservation and B's reservation fills the lobby
    lobby.request_seat(&a);

    assert_eq!(lobby.server().participant_count(), 1);
    assert!(lobby
        .client_mut(&a)
        .receive()
        .has::<lobby_client::SeatGrantFailedEvent>());
    assert!(!lobby
        .client_mut(&b)
        .receive()
        .has::<lobby_client::SeatGrantFailedEvent>());
    let failures: Vec<ConnectionId> = lobby
        .server_mut()
        .receive()
        .read::<SeatGrantFailedEvent>()
        .collect();
    assert_eq!(failures, vec![a]);

    // B's reservation still holds, and A may retry once a seat frees up
    lobby.request_seat(&b);
    assert_eq!(lobby.participants_of(&b).len(), 1);

    let participant_b = lobby.participants_of(&b)[0];
    lobby.server_mut().despawn_participant(&participant_b).unwrap();
    lobby.request_seat(&a);
    assert_eq!(lobby.participants_of(&a).len(), 2);
    assert_seats_consistent!(lobby.server());
}

#[test]
fn any_connection_may_request_a_seat_for_another() {
    let mut lobby = lobby(2, SpawnMode::None);

    let a = lobby.join_remote();
    let b = lobby.join_remote();

    lobby.client_mut(&a).request_seat_for(b);
    lobby.exchange();

    assert!(lobby.participants_of(&a).is_empty());
    let seated = lobby.participants_of(&b);
    assert_eq!(seated.len(), 1);
    assert!(!lobby.server().is_reserved(&b));
    assert!(lobby.server().is_reserved(&a));
    assert_eq!(lobby.client(&b).local_participants(), seated);
    assert!(lobby.client(&a).local_participants().is_empty());
}

#[test]
fn relocation_vacates_seat_zero() {
    let mut lobby = lobby(3, SpawnMode::Incremental);

    let (a, participant) = lobby.join_seated();
    lobby.client_mut(&a).receive();

    lobby
        .server_mut()
        .relocate_participant(&participant, 2)
        .unwrap();
    lobby.exchange();

    let server = lobby.server();
    assert_eq!(server.seat(0), None);
    assert_eq!(server.seat(2), Some(participant));
    let record = server.participant(&participant).unwrap();
    assert_eq!(record.index(), 2);
    assert_eq!(record.label(), "Player_2");
    let game_player = record.game_player().unwrap();
    assert_eq!(server.game_player(&game_player).unwrap().index(), 2);

    let client = lobby.client(&a);
    assert_eq!(client.seat_table().get(0), None);
    assert_eq!(client.seat_table().get(2), Some(participant));
    assert_eq!(client.participant(&participant).unwrap().label(), "Player_2");
    assert_eq!(client.game_player(&game_player).unwrap().index(), 2);
    assert_replica_converged!(lobby.server(), lobby.client(&a));

    let changes: Vec<(ParticipantKey, usize, usize)> = lobby
        .client_mut(&a)
        .receive()
        .read::<ParticipantIndexChangedEvent>()
        .collect();
    assert_eq!(changes, vec![(participant, 0, 2)]);

    // the freed seat is the lowest empty one again
    let (_, next) = lobby.join_seated();
    assert_eq!(lobby.server().participant(&next).unwrap().index(), 0);
}

#[test]
fn relocation_refuses_bad_targets() {
    let mut lobby = lobby(3, SpawnMode::None);

    let (_, first) = lobby.join_seated();
    let (_, second) = lobby.join_seated();

    assert_eq!(
        lobby.server_mut().relocate_participant(&first, 3),
        Err(LobbyServerError::SeatOutOfRange {
            index: 3,
            capacity: 3
        })
    );
    assert_eq!(
        lobby.server_mut().relocate_participant(&first, 1),
        Err(LobbyServerError::SeatOccupied { index: 1 })
    );
    assert_eq!(lobby.server_mut().relocate_participant(&first, 0), Ok(()));

    assert_eq!(lobby.server().seat(0), Some(first));
    assert_eq!(lobby.server().seat(1), Some(second));
}

#[test]
fn grant_without_admission_is_refused() {
    let hub = lobby_test::LocalHub::new();
    let mut server =
        LobbyServer::new(ServerConfig::default(), hub.server_transport()).expect("valid config");
    let connection = ConnectionId::new(1);
    server.connect(connection, ConnectionOrigin::Remote);

    assert_eq!(
        server.request_seat_grant(connection),
        Err(LobbyServerError::NotAdmitted { connection })
    );
}

// Properties

#[derive(Clone, Debug)]
enum SeatOp {
    Reserve(u64),
    Grant(u64),
    Release(usize),
    Cancel(u64),
}

fn seat_op() -> impl Strategy<Value = SeatOp> {
    prop_oneof![
        (0u64..6).prop_map(SeatOp::Reserve),
        (0u64..6).prop_map(SeatOp::Grant),
        (0usize..8).prop_map(SeatOp::Release),
        (0u64..6).prop_map(SeatOp::Cancel),
    ]
}

#[derive(Clone, Debug)]
enum GateOp {
    Connect(u64),
    Admit(u64),
    Grant(u64),
    Disconnect(u64),
}

fn gate_op() -> impl Strategy<Value = GateOp> {
    prop_oneof![
        (0u64..8).prop_map(GateOp::Connect),
        (0u64..8).prop_map(GateOp::Admit),
        (0u64..8).prop_map(GateOp::Grant),
        (0u64..8).prop_map(GateOp::Disconnect),
    ]
}

proptest! {
    /// No two participants ever hold the same seat, whatever the order of
    /// reservations, grants and releases
    #[test]
    fn prop_seat_indices_are_unique(
        capacity in 1usize..6,
        ops in prop::collection::vec(seat_op(), 1..60),
    ) {
        let mut allocator = SlotAllocator::new(capacity);
        let mut seated: BTreeMap<ParticipantKey, usize> = BTreeMap::new();
        let mut next_key = 0u64;

        for op in ops {
            match op {
                SeatOp::Reserve(connection) => {
                    // the gate only reserves while there is room
                    if allocator.can_join() {
                        allocator.reserve_seat(ConnectionId::new(connection));
                    }
                }
                SeatOp::Grant(connection) => {
                    let key = ParticipantKey::from_u64(next_key);
                    if let Ok((index, granted)) =
                        allocator.grant_seat(ConnectionId::new(connection), |_| key)
                    {
                        prop_assert_eq!(granted, key);
                        prop_assert!(!seated.values().any(|seat| *seat == index));
                        seated.insert(granted, index);
                        next_key += 1;
                    }
                }
                SeatOp::Release(pick) => {
                    if !seated.is_empty() {
                        let (key, index) = seated
                            .iter()
                            .nth(pick % seated.len())
                            .map(|(key, index)| (*key, *index))
                            .unwrap();
                        prop_assert!(allocator.release_seat(index, &key));
                        seated.remove(&key);
                    }
                }
                SeatOp::Cancel(connection) => {
                    allocator.cancel_reservation(&ConnectionId::new(connection));
                }
            }

            prop_assert_eq!(allocator.occupied_count(), seated.len());
            for (key, index) in seated.iter() {
                prop_assert_eq!(allocator.table().get(*index), Some(*key));
            }
            prop_assert!(allocator.occupied_count() + allocator.reservation_count() <= capacity);
        }
    }

    /// Occupied seats plus reservations stay within capacity at the instant
    /// every new reservation is accepted
    #[test]
    fn prop_admission_never_overbooks(
        capacity in 1usize..5,
        ops in prop::collection::vec(gate_op(), 1..80),
    ) {
        let mut gate = AdmissionGate::new(None);
        let mut allocator = SlotAllocator::new(capacity);
        let mut seated: BTreeMap<ParticipantKey, (ConnectionId, usize)> = BTreeMap::new();
        let mut next_key = 0u64;

        for op in ops {
            match op {
                GateOp::Connect(id) => {
                    let connection = ConnectionId::new(id);
                    if gate.status(&connection).is_none() {
                        gate.register(connection, ConnectionOrigin::Remote);
                    }
                }
                GateOp::Admit(id) => {
                    let connection = ConnectionId::new(id);
                    if let Ok(true) = gate.evaluate(&connection, None, &mut allocator) {
                        prop_assert!(allocator.is_reserved(&connection));
                        prop_assert!(
                            allocator.occupied_count() + allocator.reservation_count() <= capacity
                        );
                    }
                }
                GateOp::Grant(id) => {
                    let connection = ConnectionId::new(id);
                    if gate.is_admitted(&connection) {
                        let key = ParticipantKey::from_u64(next_key);
                        if let Ok((index, _)) = allocator.grant_seat(connection, |_| key) {
                            seated.insert(key, (connection, index));
                            next_key += 1;
                        }
                    }
                }
                GateOp::Disconnect(id) => {
                    let connection = ConnectionId::new(id);
                    gate.forget(&connection);
                    allocator.cancel_reservation(&connection);
                    let owned: Vec<(ParticipantKey, usize)> = seated
                        .iter()
                        .filter(|(_, (owner, _))| *owner == connection)
                        .map(|(key, (_, index))| (*key, *index))
                        .collect();
                    for (key, index) in owned {
                        prop_assert!(allocator.release_seat(index, &key));
                        seated.remove(&key);
                    }
                }
            }

            prop_assert!(allocator.occupied_count() + allocator.reservation_count() <= capacity);
            prop_assert_eq!(allocator.occupied_count(), seated.len());
        }
    }
}
