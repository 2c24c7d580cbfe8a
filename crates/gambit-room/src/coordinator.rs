//! Session coordination: the transition rules for every client intent.
//!
//! [`Coordinator`] is synchronous and owns its [`SessionStore`]. Each
//! call takes one inbound event, applies it to the store, and returns the
//! outbound messages it produced, addressed to specific channels. It
//! never performs I/O. The actor behind
//! [`spawn_coordinator`](crate::spawn_coordinator) feeds it events one at a
//! time and delivers what it returns.

use std::time::Instant;

use gambit_protocol::{ClientMessage, Color, EndReason, MoveRecord, RoomId, ServerMessage};
use gambit_transport::ConnectionId;

use crate::{SessionError, SessionStore};

/// Outbound messages produced by one event, in delivery order.
pub type Outbound = Vec<(ConnectionId, ServerMessage)>;

/// Applies client intents and disconnects to a [`SessionStore`].
#[derive(Debug)]
pub struct Coordinator {
    store: SessionStore,
    started: Instant,
}

impl Coordinator {
    /// Creates a coordinator that takes ownership of `store`.
    pub fn new(store: SessionStore) -> Self {
        Self {
            store,
            started: Instant::now(),
        }
    }

    /// Read access to the underlying store.
    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// Handles one message from `sender`.
    pub fn handle(&mut self, sender: ConnectionId, msg: ClientMessage) -> Outbound {
        match msg {
            ClientMessage::CreateSession => self.create_session(sender),
            ClientMessage::JoinSession { room_id } => self.join_session(sender, room_id),
            ClientMessage::SubmitMove { room_id, mv } => self.submit_move(sender, room_id, mv),
            ClientMessage::Resign { room_id } => self.resign(sender, room_id),
            ClientMessage::OfferDraw { room_id } => self.offer_draw(sender, room_id),
            ClientMessage::AcceptDraw { room_id } => self.accept_draw(sender, room_id),
            ClientMessage::Heartbeat { client_time } => vec![(
                sender,
                ServerMessage::HeartbeatAck {
                    client_time,
                    server_time: self.started.elapsed().as_millis() as u64,
                },
            )],
        }
    }

    /// Handles the loss of `conn`'s channel.
    ///
    /// If `conn` was seated, its session ends immediately and the other
    /// participant (if any) is told why.
    pub fn disconnect(&mut self, conn: ConnectionId) -> Outbound {
        let Some(room_id) = self.store.session_of(conn).cloned() else {
            return Vec::new();
        };
        let Some(session) = self.store.delete(&room_id) else {
            return Vec::new();
        };

        tracing::info!(%room_id, %conn, "session ended: participant disconnected");
        session
            .participants()
            .filter(|p| *p != conn)
            .map(|p| {
                (
                    p,
                    ServerMessage::SessionEnded {
                        winner: None,
                        reason: EndReason::OpponentDisconnected,
                    },
                )
            })
            .collect()
    }

    fn create_session(&mut self, sender: ConnectionId) -> Outbound {
        if let Some(current) = self.store.session_of(sender) {
            let err = SessionError::AlreadyInSession(sender, current.clone());
            tracing::debug!(%sender, error = %err, "create rejected");
            return vec![reject(sender, &err)];
        }

        let room_id = self.store.create();
        match self.store.bind(&room_id, sender) {
            Ok(color) => {
                tracing::info!(%room_id, %sender, %color, "session created");
                vec![(sender, ServerMessage::SessionCreated { room_id, color })]
            }
            Err(err) => {
                self.store.delete(&room_id);
                vec![reject(sender, &err)]
            }
        }
    }

    fn join_session(&mut self, sender: ConnectionId, room_id: RoomId) -> Outbound {
        let color = match self.store.bind(&room_id, sender) {
            Ok(color) => color,
            Err(err) => {
                tracing::debug!(%room_id, %sender, error = %err, "join rejected");
                return vec![reject(sender, &err)];
            }
        };

        tracing::info!(%room_id, %sender, %color, "participant joined");
        let creator = self
            .store
            .get(&room_id)
            .and_then(|session| session.opponent_of(sender));

        let mut out = vec![(
            sender,
            ServerMessage::SessionJoined {
                room_id: room_id.clone(),
                color,
            },
        )];
        if let Some(creator) = creator {
            out.push((creator, ServerMessage::ParticipantJoined { room_id }));
        }
        out
    }

    fn submit_move(&mut self, sender: ConnectionId, room_id: RoomId, mv: MoveRecord) -> Outbound {
        let Some(session) = self.store.get_mut(&room_id) else {
            tracing::debug!(%room_id, %sender, "move for unknown session dropped");
            return Vec::new();
        };

        if let Err(reason) = session.record_move(sender, mv.clone()) {
            tracing::debug!(%room_id, %sender, %reason, "move dropped");
            return Vec::new();
        }

        match session.opponent_of(sender) {
            Some(opponent) => vec![(
                opponent,
                ServerMessage::OpponentMove {
                    mv,
                    move_log: session.move_log().to_vec(),
                },
            )],
            None => Vec::new(),
        }
    }

    fn resign(&mut self, sender: ConnectionId, room_id: RoomId) -> Outbound {
        let Some(color) = self.seat_of(sender, &room_id, "resign") else {
            return Vec::new();
        };
        self.end_session(&room_id, Some(color.opponent()), EndReason::Resignation)
    }

    fn offer_draw(&mut self, sender: ConnectionId, room_id: RoomId) -> Outbound {
        if self.seat_of(sender, &room_id, "offerDraw").is_none() {
            return Vec::new();
        }
        let opponent = self
            .store
            .get(&room_id)
            .and_then(|session| session.opponent_of(sender));

        match opponent {
            Some(opponent) => {
                tracing::debug!(%room_id, %sender, "draw offered");
                vec![(opponent, ServerMessage::DrawOffered { room_id })]
            }
            None => Vec::new(),
        }
    }

    fn accept_draw(&mut self, sender: ConnectionId, room_id: RoomId) -> Outbound {
        if self.seat_of(sender, &room_id, "acceptDraw").is_none() {
            return Vec::new();
        }
        self.end_session(&room_id, None, EndReason::Agreement)
    }

    /// The color `sender` plays in `room_id`. Logs and returns `None` for
    /// unknown rooms and non-participants.
    fn seat_of(&self, sender: ConnectionId, room_id: &RoomId, intent: &'static str) -> Option<Color> {
        let Some(session) = self.store.get(room_id) else {
            tracing::debug!(%room_id, %sender, intent, "intent for unknown session dropped");
            return None;
        };
        let color = session.color_of(sender);
        if color.is_none() {
            tracing::debug!(%room_id, %sender, intent, "intent from non-participant dropped");
        }
        color
    }

    /// Deletes the session and tells every seated participant it is over.
    fn end_session(&mut self, room_id: &RoomId, winner: Option<Color>, reason: EndReason) -> Outbound {
        let Some(session) = self.store.delete(room_id) else {
            return Vec::new();
        };

        tracing::info!(%room_id, ?winner, %reason, "session ended");
        session
            .participants()
            .map(|p| (p, ServerMessage::SessionEnded { winner, reason }))
            .collect()
    }
}

/// Builds the `error` message for a rejected request.
fn reject(to: ConnectionId, err: &SessionError) -> (ConnectionId, ServerMessage) {
    (
        to,
        ServerMessage::Error {
            code: err.code(),
            message: err.to_string(),
        },
    )
}
