//! Transport layer for Gambit.
//!
//! Provides the [`Transport`] and [`Connection`] traits that the server
//! is written against, plus the WebSocket implementation used in
//! production.
//!
//! Every accepted connection is stamped with a [`ConnectionId`]. That id
//! is the only identity the coordination layer ever sees for a
//! participant: it is stored in session slots and compared by equality to
//! work out who is asking and who the opponent is.
//!
//! # Feature Flags
//!
//! - `websocket` (default) — WebSocket transport via `tokio-tungstenite`

#![allow(async_fn_in_trait)]

mod error;
#[cfg(feature = "websocket")]
mod websocket;

pub use error::TransportError;
#[cfg(feature = "websocket")]
pub use websocket::{WebSocketConnection, WebSocketTransport};

use std::fmt;
use std::time::Duration;

/// Transport-assigned identity of one participant channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Creates a new `ConnectionId` from a raw `u64`.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the underlying `u64` value.
    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Source of participant channels.
///
/// Dropping a transport stops it listening; connections already handed
/// out stay open.
pub trait Transport: Send + Sync + 'static {
    type Connection: Connection;
    type Error: std::error::Error + Send + Sync;

    /// Waits for the next peer and completes its handshake.
    async fn accept(&mut self) -> Result<Self::Connection, Self::Error>;
}

/// One participant channel: an ordered, reliable duplex frame stream.
///
/// `send` and `recv` may be awaited concurrently from the same task
/// (e.g. inside `tokio::select!`); implementations must not hold a shared
/// lock across both directions.
pub trait Connection: Send + Sync + 'static {
    type Error: std::error::Error + Send + Sync;

    /// Sends one frame to the peer.
    async fn send(&self, data: &[u8]) -> Result<(), Self::Error>;

    /// Receives the next data frame from the peer.
    ///
    /// Control frames are consumed here and only count as activity.
    /// Returns `Ok(None)` when the peer closed the channel.
    async fn recv(&self) -> Result<Option<Vec<u8>>, Self::Error>;

    /// Asks the peer to prove it is still there. A live peer answers
    /// with activity that resets [`idle_for`](Self::idle_for).
    async fn ping(&self) -> Result<(), Self::Error>;

    /// Time since the peer last sent anything, control frames included.
    fn idle_for(&self) -> Duration;

    /// Closes the channel.
    async fn close(&self) -> Result<(), Self::Error>;

    fn id(&self) -> ConnectionId;
}
