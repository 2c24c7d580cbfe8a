//! Property test: whatever mix of in-turn, out-of-turn and outsider moves
//! arrives, the log relayed to the opponent is exactly the accepted moves
//! in submission order.

use gambit_protocol::{ClientMessage, MoveRecord, RoomId, ServerMessage};
use gambit_room::{Coordinator, SessionStore};
use gambit_transport::ConnectionId;
use proptest::prelude::*;

const WHITE: u64 = 1;
const BLACK: u64 = 2;
const OUTSIDER: u64 = 3;

fn square() -> impl Strategy<Value = String> {
    (0u8..8, 1u8..=8).prop_map(|(file, rank)| format!("{}{}", (b'a' + file) as char, rank))
}

fn submission() -> impl Strategy<Value = (u64, String, String)> {
    (prop_oneof![Just(WHITE), Just(BLACK), Just(OUTSIDER)], square(), square())
}

fn setup() -> (Coordinator, RoomId) {
    let mut coord = Coordinator::new(SessionStore::new());
    let out = coord.handle(ConnectionId::new(WHITE), ClientMessage::CreateSession);
    let room_id = match out.as_slice() {
        [(_, ServerMessage::SessionCreated { room_id, .. })] => room_id.clone(),
        other => panic!("expected SessionCreated, got {other:?}"),
    };
    coord.handle(
        ConnectionId::new(BLACK),
        ClientMessage::JoinSession { room_id: room_id.clone() },
    );
    (coord, room_id)
}

proptest! {
    #[test]
    fn relayed_log_matches_accepted_moves(subs in prop::collection::vec(submission(), 0..40)) {
        let (mut coord, room_id) = setup();
        let mut accepted: Vec<MoveRecord> = Vec::new();

        for (i, (sender, from, to)) in subs.into_iter().enumerate() {
            let mv = MoveRecord {
                from,
                to,
                promotion: None,
                san: None,
                after: format!("position-{i}"),
            };
            let on_turn = if accepted.len() % 2 == 0 { WHITE } else { BLACK };
            let out = coord.handle(
                ConnectionId::new(sender),
                ClientMessage::SubmitMove { room_id: room_id.clone(), mv: mv.clone() },
            );

            if sender == on_turn {
                accepted.push(mv.clone());
                let opponent = if sender == WHITE { BLACK } else { WHITE };
                prop_assert_eq!(out.len(), 1);
                let (to_conn, msg) = &out[0];
                prop_assert_eq!(*to_conn, ConnectionId::new(opponent));
                prop_assert_eq!(
                    msg,
                    &ServerMessage::OpponentMove { mv, move_log: accepted.clone() }
                );
            } else {
                prop_assert!(out.is_empty());
            }
        }

        let session = coord.store().get(&room_id).expect("still live");
        prop_assert_eq!(session.move_log(), accepted.as_slice());
    }
}
