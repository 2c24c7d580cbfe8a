//! Session store: owns every live session and the channel → room index.

use std::collections::HashMap;

use gambit_protocol::{Color, RoomId};
use gambit_transport::ConnectionId;

use crate::{Session, SessionError};

/// In-memory registry of live sessions.
///
/// A session is present here exactly as long as it has not ended;
/// deleting it is how a session terminates. The store is a plain value
/// with no interior locking: it is owned by the coordinator task, which
/// handles one event at a time. Tests construct as many independent
/// stores as they like.
#[derive(Debug, Default)]
pub struct SessionStore {
    /// Live sessions, keyed by room id.
    sessions: HashMap<RoomId, Session>,

    /// Which room each seated channel belongs to.
    /// A channel sits in at most ONE live session (key invariant).
    memberships: HashMap<ConnectionId, RoomId>,
}

impl SessionStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a new, empty session under a fresh id and returns the id.
    pub fn create(&mut self) -> RoomId {
        let mut room_id = RoomId::generate();
        while self.sessions.contains_key(&room_id) {
            room_id = RoomId::generate();
        }
        self.sessions
            .insert(room_id.clone(), Session::new(room_id.clone()));
        tracing::debug!(%room_id, "session allocated");
        room_id
    }

    /// Seats `conn` in the next free slot of `room_id`.
    ///
    /// # Errors
    /// - [`SessionError::NotFound`] — no such live session
    /// - [`SessionError::Full`] — both seats are taken
    /// - [`SessionError::AlreadyInSession`] — `conn` already sits in a
    ///   live session (possibly this one)
    ///
    /// Nothing is mutated when an error is returned.
    pub fn bind(
        &mut self,
        room_id: &RoomId,
        conn: ConnectionId,
    ) -> Result<Color, SessionError> {
        let session = self
            .sessions
            .get_mut(room_id)
            .ok_or_else(|| SessionError::NotFound(room_id.clone()))?;

        if session.participant(Color::Black).is_some() {
            return Err(SessionError::Full(room_id.clone()));
        }
        if let Some(current) = self.memberships.get(&conn) {
            return Err(SessionError::AlreadyInSession(conn, current.clone()));
        }

        let color = session
            .seat(conn)
            .ok_or_else(|| SessionError::Full(room_id.clone()))?;
        self.memberships.insert(conn, room_id.clone());
        Ok(color)
    }

    /// Looks up a live session.
    pub fn get(&self, room_id: &RoomId) -> Option<&Session> {
        self.sessions.get(room_id)
    }

    /// Looks up a live session for mutation.
    pub fn get_mut(&mut self, room_id: &RoomId) -> Option<&mut Session> {
        self.sessions.get_mut(room_id)
    }

    /// Returns `true` if `room_id` names a live session.
    pub fn contains(&self, room_id: &RoomId) -> bool {
        self.sessions.contains_key(room_id)
    }

    /// Removes a session and releases its participants' memberships.
    ///
    /// Idempotent: deleting an absent id returns `None` and changes
    /// nothing.
    pub fn delete(&mut self, room_id: &RoomId) -> Option<Session> {
        let session = self.sessions.remove(room_id)?;
        for conn in session.participants() {
            self.memberships.remove(&conn);
        }
        tracing::debug!(%room_id, "session removed");
        Some(session)
    }

    /// The room `conn` is seated in, if any.
    pub fn session_of(&self, conn: ConnectionId) -> Option<&RoomId> {
        self.memberships.get(&conn)
    }

    /// Number of live sessions.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Returns `true` if there are no live sessions.
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
