//! Error types for the room layer.

use gambit_protocol::RoomId;
use gambit_transport::ConnectionId;

/// Errors raised while creating, joining, or addressing sessions.
///
/// The `Display` text of the request-level variants is sent to clients
/// verbatim in `error` events, so it is kept short and stable.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// No live session has this id.
    #[error("session not found")]
    NotFound(RoomId),

    /// Both slots of the session are taken.
    #[error("session full")]
    Full(RoomId),

    /// The channel is already bound to a live session.
    #[error("already in a session")]
    AlreadyInSession(ConnectionId, RoomId),

    /// The coordinator task has stopped or its command queue is closed.
    #[error("coordinator unavailable")]
    Unavailable,
}

impl SessionError {
    /// HTTP-style status code reported alongside the message.
    pub fn code(&self) -> u16 {
        match self {
            Self::NotFound(_) => 404,
            Self::Full(_) | Self::AlreadyInSession(..) => 409,
            Self::Unavailable => 503,
        }
    }
}
