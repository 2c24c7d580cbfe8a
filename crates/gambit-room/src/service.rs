//! Coordinator actor: the single task that owns all session state.
//!
//! Connection handlers never touch the [`SessionStore`] directly. They
//! send commands over a bounded mpsc channel to one actor task, which
//! runs each command through the [`Coordinator`] to completion, delivers
//! the resulting messages, and only then takes the next command. That
//! sequential loop is what makes every event atomic with respect to every
//! other event, without any locks.

use std::collections::{HashMap, VecDeque};

use gambit_protocol::{ClientMessage, ServerMessage};
use gambit_transport::ConnectionId;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, oneshot};

use crate::{Coordinator, Outbound, SessionError, SessionStore};

/// Channel sender for delivering outbound messages to one participant.
///
/// Bounded: a participant whose queue is full when the actor delivers is
/// treated as disconnected.
pub type ParticipantSender = mpsc::Sender<ServerMessage>;

/// Commands sent to the coordinator actor.
enum Command {
    /// Register a channel's outbound sender.
    Connect {
        conn: ConnectionId,
        sender: ParticipantSender,
    },

    /// Apply a client message.
    Message {
        conn: ConnectionId,
        msg: ClientMessage,
    },

    /// The channel is gone: end its session and forget its sender.
    Disconnect { conn: ConnectionId },

    /// Request a snapshot of actor counters.
    GetInfo { reply: oneshot::Sender<CoordinatorInfo> },

    /// Stop the actor. The store is dropped with it.
    Shutdown,
}

/// A snapshot of coordinator counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoordinatorInfo {
    /// Live sessions in the store.
    pub sessions: usize,
    /// Registered participant channels.
    pub connections: usize,
}

/// Handle to the running coordinator actor.
///
/// Cheap to clone; every connection handler holds one.
#[derive(Debug, Clone)]
pub struct CoordinatorHandle {
    sender: mpsc::Sender<Command>,
}

impl CoordinatorHandle {
    /// Registers `conn` so messages addressed to it reach `sender`.
    pub async fn connect(
        &self,
        conn: ConnectionId,
        sender: ParticipantSender,
    ) -> Result<(), SessionError> {
        self.send(Command::Connect { conn, sender }).await
    }

    /// Submits a client message (fire-and-forget; replies arrive on the
    /// participant's sender).
    pub async fn submit(
        &self,
        conn: ConnectionId,
        msg: ClientMessage,
    ) -> Result<(), SessionError> {
        self.send(Command::Message { conn, msg }).await
    }

    /// Reports that `conn` has gone away.
    pub async fn disconnect(&self, conn: ConnectionId) -> Result<(), SessionError> {
        self.send(Command::Disconnect { conn }).await
    }

    /// Requests the current counters.
    pub async fn info(&self) -> Result<CoordinatorInfo, SessionError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(Command::GetInfo { reply: reply_tx }).await?;
        reply_rx.await.map_err(|_| SessionError::Unavailable)
    }

    /// Tells the actor to stop.
    pub async fn shutdown(&self) -> Result<(), SessionError> {
        self.send(Command::Shutdown).await
    }

    async fn send(&self, cmd: Command) -> Result<(), SessionError> {
        self.sender
            .send(cmd)
            .await
            .map_err(|_| SessionError::Unavailable)
    }
}

/// The actor state. Runs inside a Tokio task.
struct CoordinatorActor {
    coordinator: Coordinator,
    senders: HashMap<ConnectionId, ParticipantSender>,
    receiver: mpsc::Receiver<Command>,
}

impl CoordinatorActor {
    async fn run(mut self) {
        tracing::info!("coordinator started");

        while let Some(cmd) = self.receiver.recv().await {
            match cmd {
                Command::Connect { conn, sender } => {
                    self.senders.insert(conn, sender);
                    tracing::debug!(%conn, "participant channel registered");
                }
                Command::Message { conn, msg } => {
                    tracing::trace!(%conn, kind = msg.kind(), "message");
                    let out = self.coordinator.handle(conn, msg);
                    self.dispatch(out);
                }
                Command::Disconnect { conn } => {
                    self.senders.remove(&conn);
                    let out = self.coordinator.disconnect(conn);
                    self.dispatch(out);
                    tracing::debug!(%conn, "participant channel released");
                }
                Command::GetInfo { reply } => {
                    let _ = reply.send(CoordinatorInfo {
                        sessions: self.coordinator.store().len(),
                        connections: self.senders.len(),
                    });
                }
                Command::Shutdown => {
                    tracing::info!("coordinator shutting down");
                    break;
                }
            }
        }

        tracing::info!(
            sessions = self.coordinator.store().len(),
            "coordinator stopped"
        );
    }

    /// Delivers messages in order without waiting on any participant.
    ///
    /// A closed receiver means the handler already exited and its
    /// disconnect is queued behind this command, so the message is
    /// dropped. A full receiver means the client stopped reading: it is
    /// released and disconnected on the spot, and whatever that produces
    /// is delivered in turn.
    fn dispatch(&mut self, out: Outbound) {
        let mut pending = VecDeque::from(out);
        while let Some((conn, msg)) = pending.pop_front() {
            let Some(sender) = self.senders.get(&conn) else {
                continue;
            };
            match sender.try_send(msg) {
                Ok(()) | Err(TrySendError::Closed(_)) => {}
                Err(TrySendError::Full(_)) => {
                    tracing::warn!(%conn, "outbound queue full, dropping participant");
                    self.senders.remove(&conn);
                    pending.extend(self.coordinator.disconnect(conn));
                }
            }
        }
    }
}

/// Spawns the coordinator actor around `store` and returns its handle.
///
/// `channel_size` bounds the command queue; handlers wait when it is
/// full.
pub fn spawn_coordinator(store: SessionStore, channel_size: usize) -> CoordinatorHandle {
    let (tx, rx) = mpsc::channel(channel_size);

    let actor = CoordinatorActor {
        coordinator: Coordinator::new(store),
        senders: HashMap::new(),
        receiver: rx,
    };

    tokio::spawn(actor.run());

    CoordinatorHandle { sender: tx }
}
