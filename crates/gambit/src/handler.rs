//! Per-connection handler: decode, forward, and deliver.
//!
//! Each accepted connection gets its own Tokio task running this handler.
//! The flow is:
//!   1. Register an outbound channel with the coordinator
//!   2. Loop: inbound frames → decode → coordinator;
//!      coordinator messages → encode → client
//!   3. However the loop ends, the guard reports the disconnect
//!
//! With a liveness timeout configured the handler also pings the client
//! and hangs up on one that has stopped answering. A client that is merely
//! quiet (thinking, or waiting for an opponent) keeps its session.

use std::sync::Arc;
use std::time::Duration;

use gambit_protocol::{ClientMessage, Codec, ProtocolError, ServerMessage};
use gambit_room::CoordinatorHandle;
use gambit_transport::{Connection, ConnectionId, WebSocketConnection};
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;

use crate::GambitError;
use crate::server::ServerState;

/// Drop guard that reports the disconnect when the handler exits.
///
/// This ensures cleanup happens even if the handler returns early or
/// panics. Since `Drop` is synchronous, a fire-and-forget task carries
/// the async send.
struct DisconnectGuard {
    conn_id: ConnectionId,
    coordinator: CoordinatorHandle,
}

impl Drop for DisconnectGuard {
    fn drop(&mut self) {
        let conn_id = self.conn_id;
        let coordinator = self.coordinator.clone();
        if let Ok(runtime) = tokio::runtime::Handle::try_current() {
            runtime.spawn(async move {
                let _ = coordinator.disconnect(conn_id).await;
            });
        }
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<C: Codec>(
    conn: WebSocketConnection,
    state: Arc<ServerState<C>>,
) -> Result<(), GambitError> {
    let conn_id = conn.id();
    tracing::info!(%conn_id, "connection accepted");

    let (sender, mut outbound) = mpsc::channel(state.outbound_buffer);
    state.coordinator.connect(conn_id, sender).await?;
    let _guard = DisconnectGuard {
        conn_id,
        coordinator: state.coordinator.clone(),
    };

    let liveness = state.liveness_timeout;
    let mut keepalive = tokio::time::interval(ping_period(liveness));
    keepalive.set_missed_tick_behavior(MissedTickBehavior::Delay);
    keepalive.reset();

    loop {
        tokio::select! {
            inbound = conn.recv() => match inbound {
                Ok(Some(data)) => {
                    handle_frame(&conn, &state, conn_id, &data).await?;
                }
                Ok(None) => {
                    tracing::info!(%conn_id, "connection closed");
                    break;
                }
                Err(e) => {
                    tracing::debug!(%conn_id, error = %e, "recv error");
                    break;
                }
            },

            outgoing = outbound.recv() => match outgoing {
                Some(msg) => send_message(&conn, &state.codec, &msg).await?,
                None => {
                    // Coordinator stopped, or this client fell too far behind.
                    tracing::info!(%conn_id, "released by coordinator");
                    let _ = conn.close().await;
                    break;
                }
            },

            _ = keepalive.tick(), if liveness.is_some() => {
                if liveness.is_some_and(|limit| conn.idle_for() >= limit) {
                    tracing::info!(%conn_id, "peer unresponsive");
                    let _ = conn.close().await;
                    break;
                }
                conn.ping().await?;
            }
        }
    }

    // _guard drops here → coordinator disconnect fires.
    Ok(())
}

/// Decodes one inbound frame and forwards it to the coordinator.
///
/// Frames that do not decode into a [`ClientMessage`] are answered with
/// `error{400}` and never reach the coordinator.
async fn handle_frame<C: Codec>(
    conn: &WebSocketConnection,
    state: &ServerState<C>,
    conn_id: ConnectionId,
    data: &[u8],
) -> Result<(), GambitError> {
    let msg: ClientMessage = match state.codec.decode(data) {
        Ok(msg) => msg,
        Err(e) => {
            tracing::debug!(%conn_id, error = %e, "failed to decode message");
            return send_message(conn, &state.codec, &invalid_message(e)).await;
        }
    };

    state.coordinator.submit(conn_id, msg).await?;
    Ok(())
}

/// Encodes and sends a server message to the client.
async fn send_message(
    conn: &WebSocketConnection,
    codec: &impl Codec,
    msg: &ServerMessage,
) -> Result<(), GambitError> {
    let bytes = codec.encode(msg)?;
    conn.send(&bytes).await?;
    Ok(())
}

/// The `error` reply for a frame that failed to decode.
fn invalid_message(err: ProtocolError) -> ServerMessage {
    let detail = match err {
        ProtocolError::Decode(source) => source.to_string(),
        other => other.to_string(),
    };
    ServerMessage::Error {
        code: 400,
        message: ProtocolError::InvalidMessage(detail).to_string(),
    }
}

/// How often to ping: twice per liveness window, so a live peer has a
/// full round trip to answer before the window closes.
fn ping_period(liveness: Option<Duration>) -> Duration {
    match liveness {
        Some(limit) => (limit / 2).max(Duration::from_millis(1)),
        // Never ticks: the branch is disabled without a timeout.
        None => Duration::from_secs(3600),
    }
}
