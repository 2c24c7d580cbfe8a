//! The session record: one two-player match.

use std::fmt;

use gambit_protocol::{Color, MoveRecord, RoomId};
use gambit_transport::ConnectionId;

// ---------------------------------------------------------------------------
// SessionState
// ---------------------------------------------------------------------------

/// Lifecycle state of a live session.
///
/// ```text
/// Open ──(second participant joins)──→ Active ──(end)──→ removed from store
/// ```
///
/// There is no "terminated" variant: a session that ends is deleted from
/// the [`SessionStore`](crate::SessionStore) and its id is never revived.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Only the creator is seated; waiting for an opponent.
    Open,
    /// Both seats are taken and moves are being relayed.
    Active,
}

impl SessionState {
    /// Returns `true` if the session still accepts a participant.
    pub fn is_joinable(&self) -> bool {
        matches!(self, Self::Open)
    }

    /// Returns `true` if both participants are seated.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open => write!(f, "Open"),
            Self::Active => write!(f, "Active"),
        }
    }
}

// ---------------------------------------------------------------------------
// MoveRejection
// ---------------------------------------------------------------------------

/// Why a submitted move was not recorded. Never shown to clients; moves
/// that fail these checks are dropped and logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveRejection {
    /// The sender does not occupy either seat.
    NotParticipant,
    /// The opponent has not joined yet.
    NotActive,
    /// It is the other color's turn.
    OutOfTurn { expected: Color },
}

impl fmt::Display for MoveRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotParticipant => write!(f, "sender is not a participant"),
            Self::NotActive => write!(f, "session has no opponent yet"),
            Self::OutOfTurn { expected } => write!(f, "{expected} to move"),
        }
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// One match between two participant channels.
///
/// Seat assignment is fixed: the first channel bound plays White, the
/// second plays Black. The side to move is derived from the length of
/// the move log, so it can never drift from the recorded history.
#[derive(Debug, Clone)]
pub struct Session {
    id: RoomId,
    white: Option<ConnectionId>,
    black: Option<ConnectionId>,
    move_log: Vec<MoveRecord>,
    /// Board state after the last accepted move, as reported by the mover.
    position: Option<String>,
}

impl Session {
    pub(crate) fn new(id: RoomId) -> Self {
        Self {
            id,
            white: None,
            black: None,
            move_log: Vec::new(),
            position: None,
        }
    }

    /// The session's room id.
    pub fn id(&self) -> &RoomId {
        &self.id
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        if self.black.is_some() {
            SessionState::Active
        } else {
            SessionState::Open
        }
    }

    /// The channel seated as `color`, if any.
    pub fn participant(&self, color: Color) -> Option<ConnectionId> {
        match color {
            Color::White => self.white,
            Color::Black => self.black,
        }
    }

    /// Every seated channel, White first.
    pub fn participants(&self) -> impl Iterator<Item = ConnectionId> + '_ {
        self.white.iter().chain(self.black.iter()).copied()
    }

    /// The color `conn` plays in this session, if it is seated here.
    pub fn color_of(&self, conn: ConnectionId) -> Option<Color> {
        if self.white == Some(conn) {
            Some(Color::White)
        } else if self.black == Some(conn) {
            Some(Color::Black)
        } else {
            None
        }
    }

    /// The channel sitting across from `conn`, if both are seated.
    pub fn opponent_of(&self, conn: ConnectionId) -> Option<ConnectionId> {
        self.color_of(conn)
            .and_then(|color| self.participant(color.opponent()))
    }

    /// The side allowed to submit the next move.
    pub fn turn(&self) -> Color {
        if self.move_log.len() % 2 == 0 {
            Color::White
        } else {
            Color::Black
        }
    }

    /// Every accepted move, oldest first.
    pub fn move_log(&self) -> &[MoveRecord] {
        &self.move_log
    }

    /// Board state after the last accepted move.
    pub fn position(&self) -> Option<&str> {
        self.position.as_deref()
    }

    /// Seats `conn` in the next free slot and returns its color.
    ///
    /// Returns `None` when both seats are already taken; the session is
    /// left untouched in that case.
    pub(crate) fn seat(&mut self, conn: ConnectionId) -> Option<Color> {
        if self.white.is_none() {
            self.white = Some(conn);
            Some(Color::White)
        } else if self.black.is_none() {
            self.black = Some(conn);
            Some(Color::Black)
        } else {
            None
        }
    }

    /// Appends a move submitted by `sender`.
    ///
    /// Only seat identity and turn order are checked here. Whether the
    /// move is legal chess was decided by the sender's rules engine.
    ///
    /// A session still waiting in [`SessionState::Open`] rejects every
    /// move with [`MoveRejection::NotActive`], White's included: clients
    /// only show the board once the opponent has joined, so the log starts
    /// with both players seated.
    pub(crate) fn record_move(
        &mut self,
        sender: ConnectionId,
        mv: MoveRecord,
    ) -> Result<(), MoveRejection> {
        let color = self
            .color_of(sender)
            .ok_or(MoveRejection::NotParticipant)?;
        if !self.state().is_active() {
            return Err(MoveRejection::NotActive);
        }
        let expected = self.turn();
        if color != expected {
            return Err(MoveRejection::OutOfTurn { expected });
        }

        self.position = Some(mv.after.clone());
        self.move_log.push(mv);
        Ok(())
    }
}
