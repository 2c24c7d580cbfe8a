//! Wire types for the Gambit session coordinator.
//!
//! Everything in this module travels over the network as JSON. Both
//! message enums are *internally tagged* on a `"type"` field with
//! camelCase names, which is the shape browser clients find easiest to
//! switch on:
//!
//! ```text
//! { "type": "joinSession", "roomId": "5f0c…" }
//! { "type": "sessionEnded", "winner": "white", "reason": "resignation" }
//! ```
//!
//! Decoding into [`ClientMessage`] is the schema check: a frame that does
//! not match one of its variants never reaches the coordinator.

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// RoomId
// ---------------------------------------------------------------------------

/// Identifier of one session, doubling as the invitation code players
/// share out of band.
///
/// Freshly generated ids are hyphenated UUIDs carrying 122 random bits,
/// so collisions between live sessions are not a practical concern. On
/// the wire the id is a plain string (`#[serde(transparent)]`); incoming
/// ids are not parsed, so a malformed code is simply an unknown room.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(String);

impl RoomId {
    /// Generates a new random room id.
    pub fn generate() -> Self {
        let bytes: [u8; 16] = rand::rng().random();
        let uuid = uuid::Builder::from_random_bytes(bytes).into_uuid();
        Self(uuid.hyphenated().to_string())
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for RoomId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl From<String> for RoomId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Color
// ---------------------------------------------------------------------------

/// Side of the board. The session creator always plays White.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    White,
    Black,
}

impl Color {
    /// Returns the other side.
    pub fn opponent(self) -> Self {
        match self {
            Self::White => Self::Black,
            Self::Black => Self::White,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::White => write!(f, "white"),
            Self::Black => write!(f, "black"),
        }
    }
}

// ---------------------------------------------------------------------------
// EndReason
// ---------------------------------------------------------------------------

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EndReason {
    /// One participant resigned; the other wins.
    #[serde(rename = "resignation")]
    Resignation,

    /// Both participants agreed to a draw.
    #[serde(rename = "agreement")]
    Agreement,

    /// The other participant's channel went away.
    #[serde(rename = "opponent disconnected")]
    OpponentDisconnected,
}

impl fmt::Display for EndReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Resignation => write!(f, "resignation"),
            Self::Agreement => write!(f, "agreement"),
            Self::OpponentDisconnected => write!(f, "opponent disconnected"),
        }
    }
}

// ---------------------------------------------------------------------------
// MoveRecord
// ---------------------------------------------------------------------------

/// One move as reported by the mover's client.
///
/// The server never interprets these fields. Legality was already decided
/// by the client-side rules engine; the record is stored and forwarded
/// verbatim so the opponent's engine can replay it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveRecord {
    /// Origin square, e.g. `"e2"`.
    pub from: String,

    /// Destination square, e.g. `"e4"`.
    pub to: String,

    /// Promotion piece, if any (`"q"`, `"r"`, `"b"`, `"n"`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub promotion: Option<String>,

    /// Standard algebraic notation, if the client supplied it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub san: Option<String>,

    /// Serialized board state after the move (FEN).
    pub after: String,
}

// ---------------------------------------------------------------------------
// ClientMessage — client → server
// ---------------------------------------------------------------------------

/// Everything a client may send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ClientMessage {
    /// Open a new room and take the White slot.
    CreateSession,

    /// Take the Black slot of an existing room.
    JoinSession { room_id: RoomId },

    /// Report a move made on the client's board.
    SubmitMove {
        room_id: RoomId,
        #[serde(rename = "move")]
        mv: MoveRecord,
    },

    /// Concede the game.
    Resign { room_id: RoomId },

    /// Propose a draw to the opponent.
    OfferDraw { room_id: RoomId },

    /// Agree to a draw.
    AcceptDraw { room_id: RoomId },

    /// Keep-alive. Answered with [`ServerMessage::HeartbeatAck`].
    Heartbeat { client_time: u64 },
}

impl ClientMessage {
    /// Short name used in log lines.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::CreateSession => "createSession",
            Self::JoinSession { .. } => "joinSession",
            Self::SubmitMove { .. } => "submitMove",
            Self::Resign { .. } => "resign",
            Self::OfferDraw { .. } => "offerDraw",
            Self::AcceptDraw { .. } => "acceptDraw",
            Self::Heartbeat { .. } => "heartbeat",
        }
    }
}

// ---------------------------------------------------------------------------
// ServerMessage — server → client
// ---------------------------------------------------------------------------

/// Everything the server may send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ServerMessage {
    /// The requester created `room_id` and plays `color`.
    SessionCreated { room_id: RoomId, color: Color },

    /// The requester joined `room_id` and plays `color`.
    SessionJoined { room_id: RoomId, color: Color },

    /// Sent to the creator once an opponent has joined.
    ParticipantJoined { room_id: RoomId },

    /// The opponent moved. `move_log` is the full history, oldest first,
    /// including `mv`.
    OpponentMove {
        #[serde(rename = "move")]
        mv: MoveRecord,
        move_log: Vec<MoveRecord>,
    },

    /// The opponent proposes a draw.
    DrawOffered { room_id: RoomId },

    /// The session is over. `winner` is `null` for draws and disconnects.
    SessionEnded {
        winner: Option<Color>,
        reason: EndReason,
    },

    /// Reply to [`ClientMessage::Heartbeat`]. `server_time` is
    /// milliseconds since the coordinator started.
    HeartbeatAck { client_time: u64, server_time: u64 },

    /// A request was rejected. `code` follows HTTP conventions
    /// (400 malformed, 404 not found, 409 conflict).
    Error { code: u16, message: String },
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    //! The JSON shapes here are what the browser client switches on, so
    //! these tests pin field names and tags rather than round-tripping.

    use serde_json::json;

    use super::*;

    fn e2e4() -> MoveRecord {
        MoveRecord {
            from: "e2".into(),
            to: "e4".into(),
            promotion: None,
            san: Some("e4".into()),
            after: "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1"
                .into(),
        }
    }

    // =====================================================================
    // RoomId
    // =====================================================================

    #[test]
    fn test_room_id_generate_is_hyphenated_v4_uuid() {
        let id = RoomId::generate();
        let parsed = uuid::Uuid::parse_str(id.as_str()).expect("valid uuid");
        assert_eq!(parsed.get_version_num(), 4);
        assert_eq!(id.as_str().len(), 36);
    }

    #[test]
    fn test_room_id_generate_does_not_repeat() {
        let ids: std::collections::HashSet<_> =
            (0..1000).map(|_| RoomId::generate()).collect();
        assert_eq!(ids.len(), 1000);
    }

    #[test]
    fn test_room_id_serializes_as_plain_string() {
        let json = serde_json::to_string(&RoomId::from("abc")).unwrap();
        assert_eq!(json, "\"abc\"");
    }

    #[test]
    fn test_room_id_display_is_raw_string() {
        assert_eq!(RoomId::from("room-7").to_string(), "room-7");
    }

    // =====================================================================
    // Color / EndReason
    // =====================================================================

    #[test]
    fn test_color_opponent() {
        assert_eq!(Color::White.opponent(), Color::Black);
        assert_eq!(Color::Black.opponent(), Color::White);
    }

    #[test]
    fn test_color_serializes_lowercase() {
        assert_eq!(serde_json::to_value(Color::White).unwrap(), "white");
        assert_eq!(serde_json::to_value(Color::Black).unwrap(), "black");
    }

    #[test]
    fn test_end_reason_wire_names_match_display() {
        for reason in [
            EndReason::Resignation,
            EndReason::Agreement,
            EndReason::OpponentDisconnected,
        ] {
            let json = serde_json::to_value(reason).unwrap();
            assert_eq!(json, reason.to_string());
        }
        assert_eq!(
            serde_json::to_value(EndReason::OpponentDisconnected).unwrap(),
            "opponent disconnected"
        );
    }

    // =====================================================================
    // MoveRecord
    // =====================================================================

    #[test]
    fn test_move_record_omits_absent_optionals() {
        let mv = MoveRecord { san: None, ..e2e4() };
        let json = serde_json::to_value(&mv).unwrap();
        assert_eq!(json["from"], "e2");
        assert_eq!(json["to"], "e4");
        assert!(json.get("promotion").is_none());
        assert!(json.get("san").is_none());
    }

    #[test]
    fn test_move_record_accepts_minimal_object() {
        let mv: MoveRecord = serde_json::from_value(json!({
            "from": "e7", "to": "e8", "after": "4Q3/8/8/8/8/8/8/4K2k b - - 0 1",
            "promotion": "q"
        }))
        .unwrap();
        assert_eq!(mv.promotion.as_deref(), Some("q"));
        assert_eq!(mv.san, None);
    }

    #[test]
    fn test_move_record_requires_after() {
        let result: Result<MoveRecord, _> =
            serde_json::from_value(json!({ "from": "e2", "to": "e4" }));
        assert!(result.is_err());
    }

    // =====================================================================
    // ClientMessage
    // =====================================================================

    #[test]
    fn test_client_create_session_has_no_payload() {
        let msg: ClientMessage =
            serde_json::from_value(json!({ "type": "createSession" })).unwrap();
        assert_eq!(msg, ClientMessage::CreateSession);
        assert_eq!(msg.kind(), "createSession");
    }

    #[test]
    fn test_client_join_session_uses_camel_case_room_id() {
        let msg: ClientMessage = serde_json::from_value(
            json!({ "type": "joinSession", "roomId": "r1" }),
        )
        .unwrap();
        assert_eq!(
            msg,
            ClientMessage::JoinSession { room_id: RoomId::from("r1") }
        );
    }

    #[test]
    fn test_client_submit_move_field_is_named_move() {
        let msg = ClientMessage::SubmitMove {
            room_id: RoomId::from("r1"),
            mv: e2e4(),
        };
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "submitMove");
        assert_eq!(json["roomId"], "r1");
        assert_eq!(json["move"]["to"], "e4");
        assert_eq!(msg.kind(), "submitMove");
    }

    #[test]
    fn test_client_heartbeat_json_format() {
        let msg: ClientMessage = serde_json::from_value(
            json!({ "type": "heartbeat", "clientTime": 99 }),
        )
        .unwrap();
        assert_eq!(msg, ClientMessage::Heartbeat { client_time: 99 });
    }

    #[test]
    fn test_client_unknown_type_is_rejected() {
        let result: Result<ClientMessage, _> =
            serde_json::from_value(json!({ "type": "castleQueenside" }));
        assert!(result.is_err());
    }

    #[test]
    fn test_client_missing_room_id_is_rejected() {
        let result: Result<ClientMessage, _> =
            serde_json::from_value(json!({ "type": "resign" }));
        assert!(result.is_err());
    }

    // =====================================================================
    // ServerMessage
    // =====================================================================

    #[test]
    fn test_server_session_created_json_format() {
        let msg = ServerMessage::SessionCreated {
            room_id: RoomId::from("r1"),
            color: Color::White,
        };
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(
            json,
            json!({ "type": "sessionCreated", "roomId": "r1", "color": "white" })
        );
    }

    #[test]
    fn test_server_opponent_move_json_format() {
        let msg = ServerMessage::OpponentMove {
            mv: e2e4(),
            move_log: vec![e2e4()],
        };
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "opponentMove");
        assert_eq!(json["move"]["from"], "e2");
        assert_eq!(json["moveLog"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_server_session_ended_draw_has_null_winner() {
        let msg = ServerMessage::SessionEnded {
            winner: None,
            reason: EndReason::Agreement,
        };
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(
            json,
            json!({ "type": "sessionEnded", "winner": null, "reason": "agreement" })
        );
    }

    #[test]
    fn test_server_heartbeat_ack_json_format() {
        let msg = ServerMessage::HeartbeatAck {
            client_time: 5,
            server_time: 7,
        };
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "heartbeatAck");
        assert_eq!(json["clientTime"], 5);
        assert_eq!(json["serverTime"], 7);
    }

    #[test]
    fn test_server_error_json_format() {
        let msg = ServerMessage::Error {
            code: 404,
            message: "session not found".into(),
        };
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "error");
        assert_eq!(json["code"], 404);
        assert_eq!(json["message"], "session not found");
    }
}
