//! Integration tests for the coordinator actor, driven through its handle
//! with in-memory participant channels.

use std::time::Duration;

use gambit_protocol::{ClientMessage, Color, EndReason, MoveRecord, RoomId, ServerMessage};
use gambit_room::{CoordinatorHandle, CoordinatorInfo, SessionStore, spawn_coordinator};
use gambit_transport::ConnectionId;
use tokio::sync::mpsc;

// =========================================================================
// Helpers
// =========================================================================

type Inbox = mpsc::Receiver<ServerMessage>;

fn conn(id: u64) -> ConnectionId {
    ConnectionId::new(id)
}

fn mv(from: &str, to: &str) -> MoveRecord {
    MoveRecord {
        from: from.into(),
        to: to.into(),
        promotion: None,
        san: None,
        after: format!("fen:{from}{to}"),
    }
}

async fn register(handle: &CoordinatorHandle, id: u64) -> Inbox {
    register_with_capacity(handle, id, 16).await
}

async fn register_with_capacity(handle: &CoordinatorHandle, id: u64, capacity: usize) -> Inbox {
    let (tx, rx) = mpsc::channel(capacity);
    handle.connect(conn(id), tx).await.expect("coordinator running");
    rx
}

async fn next(inbox: &mut Inbox) -> ServerMessage {
    tokio::time::timeout(Duration::from_secs(2), inbox.recv())
        .await
        .expect("timed out waiting for message")
        .expect("inbox closed")
}

/// Asserts nothing else is queued once the actor has drained its queue.
async fn assert_quiet(handle: &CoordinatorHandle, inbox: &mut Inbox) {
    // `info` round-trips through the actor, so every earlier command has
    // been fully dispatched by the time it returns.
    handle.info().await.unwrap();
    assert!(inbox.try_recv().is_err(), "unexpected extra message");
}

/// conn(1) creates and conn(2) joins. Drains the setup messages.
async fn active_game(handle: &CoordinatorHandle) -> (RoomId, Inbox, Inbox) {
    let mut white = register(handle, 1).await;
    let mut black = register(handle, 2).await;

    handle.submit(conn(1), ClientMessage::CreateSession).await.unwrap();
    let room_id = match next(&mut white).await {
        ServerMessage::SessionCreated { room_id, color } => {
            assert_eq!(color, Color::White);
            room_id
        }
        other => panic!("expected SessionCreated, got {other:?}"),
    };

    handle
        .submit(conn(2), ClientMessage::JoinSession { room_id: room_id.clone() })
        .await
        .unwrap();
    assert_eq!(
        next(&mut black).await,
        ServerMessage::SessionJoined { room_id: room_id.clone(), color: Color::Black }
    );
    assert_eq!(
        next(&mut white).await,
        ServerMessage::ParticipantJoined { room_id: room_id.clone() }
    );

    (room_id, white, black)
}

// =========================================================================
// Tests
// =========================================================================

#[tokio::test]
async fn test_create_join_move_resign_scenario() {
    let handle = spawn_coordinator(SessionStore::new(), 16);
    let (room_id, mut white, mut black) = active_game(&handle).await;

    handle
        .submit(conn(1), ClientMessage::SubmitMove { room_id: room_id.clone(), mv: mv("e2", "e4") })
        .await
        .unwrap();
    assert_eq!(
        next(&mut black).await,
        ServerMessage::OpponentMove { mv: mv("e2", "e4"), move_log: vec![mv("e2", "e4")] }
    );

    handle.submit(conn(2), ClientMessage::Resign { room_id: room_id.clone() }).await.unwrap();
    let expected = ServerMessage::SessionEnded {
        winner: Some(Color::White),
        reason: EndReason::Resignation,
    };
    assert_eq!(next(&mut white).await, expected);
    assert_eq!(next(&mut black).await, expected);

    // The room is gone for good.
    let mut late = register(&handle, 3).await;
    handle.submit(conn(3), ClientMessage::JoinSession { room_id }).await.unwrap();
    assert_eq!(
        next(&mut late).await,
        ServerMessage::Error { code: 404, message: "session not found".into() }
    );
}

#[tokio::test]
async fn test_full_room_produces_no_events_for_seated_players() {
    let handle = spawn_coordinator(SessionStore::new(), 16);
    let (room_id, mut white, mut black) = active_game(&handle).await;
    let mut third = register(&handle, 3).await;

    handle.submit(conn(3), ClientMessage::JoinSession { room_id }).await.unwrap();

    assert_eq!(
        next(&mut third).await,
        ServerMessage::Error { code: 409, message: "session full".into() }
    );
    assert_quiet(&handle, &mut white).await;
    assert_quiet(&handle, &mut black).await;
}

#[tokio::test]
async fn test_concurrent_joins_exactly_one_wins() {
    let handle = spawn_coordinator(SessionStore::new(), 16);
    let mut creator = register(&handle, 1).await;
    let mut joiner = register(&handle, 2).await;

    handle.submit(conn(1), ClientMessage::CreateSession).await.unwrap();
    let room_id = match next(&mut creator).await {
        ServerMessage::SessionCreated { room_id, .. } => room_id,
        other => panic!("expected SessionCreated, got {other:?}"),
    };

    let join = ClientMessage::JoinSession { room_id };
    let (a, b) = tokio::join!(
        handle.submit(conn(2), join.clone()),
        handle.submit(conn(2), join),
    );
    a.unwrap();
    b.unwrap();

    let replies = [next(&mut joiner).await, next(&mut joiner).await];
    let joined = replies
        .iter()
        .filter(|m| matches!(m, ServerMessage::SessionJoined { .. }))
        .count();
    let full = replies
        .iter()
        .filter(|m| matches!(m, ServerMessage::Error { message, .. } if message == "session full"))
        .count();
    assert_eq!((joined, full), (1, 1));

    assert!(matches!(next(&mut creator).await, ServerMessage::ParticipantJoined { .. }));
    assert_quiet(&handle, &mut creator).await;
}

#[tokio::test]
async fn test_draw_agreement_reaches_both() {
    let handle = spawn_coordinator(SessionStore::new(), 16);
    let (room_id, mut white, mut black) = active_game(&handle).await;

    handle.submit(conn(2), ClientMessage::OfferDraw { room_id: room_id.clone() }).await.unwrap();
    assert_eq!(next(&mut white).await, ServerMessage::DrawOffered { room_id: room_id.clone() });

    handle.submit(conn(1), ClientMessage::AcceptDraw { room_id }).await.unwrap();
    let expected = ServerMessage::SessionEnded { winner: None, reason: EndReason::Agreement };
    assert_eq!(next(&mut white).await, expected);
    assert_eq!(next(&mut black).await, expected);

    assert_eq!(
        handle.info().await.unwrap(),
        CoordinatorInfo { sessions: 0, connections: 2 }
    );
}

#[tokio::test]
async fn test_disconnect_notifies_remaining_player_exactly_once() {
    let handle = spawn_coordinator(SessionStore::new(), 16);
    let (_room_id, mut white, _black) = active_game(&handle).await;

    handle.disconnect(conn(2)).await.unwrap();

    assert_eq!(
        next(&mut white).await,
        ServerMessage::SessionEnded { winner: None, reason: EndReason::OpponentDisconnected }
    );
    assert_quiet(&handle, &mut white).await;
    assert_eq!(
        handle.info().await.unwrap(),
        CoordinatorInfo { sessions: 0, connections: 1 }
    );
}

#[tokio::test]
async fn test_moves_arrive_in_submission_order() {
    let handle = spawn_coordinator(SessionStore::new(), 4);
    let (room_id, mut white, mut black) = active_game(&handle).await;
    let line = [("e2", "e4"), ("e7", "e5"), ("g1", "f3"), ("b8", "c6"), ("f1", "b5")];

    for (i, (from, to)) in line.iter().enumerate() {
        let sender = if i % 2 == 0 { conn(1) } else { conn(2) };
        handle
            .submit(sender, ClientMessage::SubmitMove { room_id: room_id.clone(), mv: mv(from, to) })
            .await
            .unwrap();
    }

    let mut last_log = Vec::new();
    for i in 0..line.len() {
        let inbox = if i % 2 == 0 { &mut black } else { &mut white };
        match next(inbox).await {
            ServerMessage::OpponentMove { mv: got, move_log } => {
                assert_eq!(got, mv(line[i].0, line[i].1));
                assert_eq!(move_log.len(), i + 1);
                last_log = move_log;
            }
            other => panic!("expected OpponentMove, got {other:?}"),
        }
    }
    let expected: Vec<_> = line.iter().map(|(f, t)| mv(f, t)).collect();
    assert_eq!(last_log, expected);
}

#[tokio::test]
async fn test_independent_coordinators_do_not_share_state() {
    let a = spawn_coordinator(SessionStore::new(), 16);
    let b = spawn_coordinator(SessionStore::new(), 16);
    let mut inbox_a = register(&a, 1).await;
    let mut inbox_b = register(&b, 2).await;

    a.submit(conn(1), ClientMessage::CreateSession).await.unwrap();
    let room_id = match next(&mut inbox_a).await {
        ServerMessage::SessionCreated { room_id, .. } => room_id,
        other => panic!("expected SessionCreated, got {other:?}"),
    };

    b.submit(conn(2), ClientMessage::JoinSession { room_id }).await.unwrap();
    assert!(matches!(
        next(&mut inbox_b).await,
        ServerMessage::Error { code: 404, .. }
    ));
}

#[tokio::test]
async fn test_participant_that_stops_reading_is_disconnected() {
    let handle = spawn_coordinator(SessionStore::new(), 16);
    let mut white = register_with_capacity(&handle, 1, 1).await;
    let mut black = register(&handle, 2).await;

    handle.submit(conn(1), ClientMessage::CreateSession).await.unwrap();
    let room_id = match next(&mut white).await {
        ServerMessage::SessionCreated { room_id, .. } => room_id,
        other => panic!("expected SessionCreated, got {other:?}"),
    };

    // White stops reading. participantJoined takes its only slot...
    handle
        .submit(conn(2), ClientMessage::JoinSession { room_id: room_id.clone() })
        .await
        .unwrap();
    assert!(matches!(next(&mut black).await, ServerMessage::SessionJoined { .. }));

    // ...so the draw offer overflows and ends the game for black.
    handle.submit(conn(2), ClientMessage::OfferDraw { room_id }).await.unwrap();
    assert_eq!(
        next(&mut black).await,
        ServerMessage::SessionEnded { winner: None, reason: EndReason::OpponentDisconnected }
    );
    assert_eq!(
        handle.info().await.unwrap(),
        CoordinatorInfo { sessions: 0, connections: 1 }
    );

    // White's queue holds what fit, then closes.
    assert!(matches!(next(&mut white).await, ServerMessage::ParticipantJoined { .. }));
    assert!(white.recv().await.is_none());
}

#[tokio::test]
async fn test_shutdown_makes_handle_unavailable() {
    let handle = spawn_coordinator(SessionStore::new(), 16);
    handle.shutdown().await.unwrap();

    // Give the actor a moment to exit and drop its receiver.
    tokio::time::sleep(Duration::from_millis(20)).await;

    assert!(handle.info().await.is_err());
}
