//! `GambitServer` builder and server loop.
//!
//! This is the entry point for running a Gambit server. It ties the
//! layers together: transport → protocol → coordinator.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use gambit_protocol::{Codec, JsonCodec};
use gambit_room::{CoordinatorHandle, SessionStore, spawn_coordinator};
use gambit_transport::{Transport, WebSocketTransport};

use crate::handler::handle_connection;
use crate::{GambitError, ServerConfig};

/// Shared server state passed to each connection handler task.
///
/// Wrapped in `Arc` so it can be cheaply cloned across tasks. All
/// mutable session state lives behind the coordinator handle.
pub(crate) struct ServerState<C: Codec> {
    pub(crate) coordinator: CoordinatorHandle,
    pub(crate) codec: C,
    pub(crate) liveness_timeout: Option<Duration>,
    pub(crate) outbound_buffer: usize,
}

/// Builder for configuring and starting a Gambit server.
///
/// # Example
///
/// ```rust,no_run
/// use std::time::Duration;
///
/// use gambit::prelude::*;
///
/// # async fn start() -> Result<(), GambitError> {
/// let server = GambitServer::builder()
///     .bind("0.0.0.0:3001")
///     .liveness_timeout(Some(Duration::from_secs(30)))
///     .build()
///     .await?;
/// server.run().await
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct GambitServerBuilder {
    config: ServerConfig,
}

impl GambitServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces every setting with `config`.
    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.config.bind_addr = addr.to_string();
        self
    }

    /// Enables ping-based liveness checks. `None` (the default) disables
    /// them; see [`ServerConfig::liveness_timeout`].
    pub fn liveness_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.config.liveness_timeout = timeout;
        self
    }

    /// Sets how many messages may queue for one client (minimum 1).
    pub fn outbound_buffer(mut self, size: usize) -> Self {
        self.config.outbound_buffer = size;
        self
    }

    /// Sets the coordinator command queue capacity (minimum 1).
    pub fn command_buffer(mut self, size: usize) -> Self {
        self.config.command_buffer = size;
        self
    }

    /// Binds the listener and starts the coordinator, speaking JSON.
    pub async fn build(self) -> Result<GambitServer<JsonCodec>, GambitError> {
        self.build_with_codec(JsonCodec).await
    }

    /// Binds the listener and starts the coordinator with a custom codec.
    pub async fn build_with_codec<C: Codec>(
        self,
        codec: C,
    ) -> Result<GambitServer<C>, GambitError> {
        let transport = WebSocketTransport::bind(&self.config.bind_addr).await?;

        let coordinator =
            spawn_coordinator(SessionStore::new(), self.config.command_buffer.max(1));

        let state = Arc::new(ServerState {
            coordinator,
            codec,
            liveness_timeout: self.config.liveness_timeout,
            outbound_buffer: self.config.outbound_buffer.max(1),
        });

        Ok(GambitServer { transport, state })
    }
}

/// A bound Gambit server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct GambitServer<C: Codec> {
    transport: WebSocketTransport,
    state: Arc<ServerState<C>>,
}

impl GambitServer<JsonCodec> {
    /// Creates a new builder.
    pub fn builder() -> GambitServerBuilder {
        GambitServerBuilder::new()
    }
}

impl<C: Codec> GambitServer<C> {
    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    /// Handle to the coordinator, for introspection and shutdown.
    pub fn coordinator(&self) -> &CoordinatorHandle {
        &self.state.coordinator
    }

    /// Runs the server accept loop until the process is terminated.
    pub async fn run(self) -> Result<(), GambitError> {
        self.run_until(std::future::pending()).await
    }

    /// Runs the accept loop until `shutdown` completes.
    ///
    /// Spawns a handler task for each accepted connection. On shutdown the
    /// listener is closed and the coordinator stopped; every open
    /// connection then sees its outbound queue close and hangs up.
    pub async fn run_until<F>(mut self, shutdown: F) -> Result<(), GambitError>
    where
        F: Future<Output = ()>,
    {
        match self.transport.local_addr() {
            Ok(addr) => tracing::info!(%addr, "gambit server listening"),
            Err(_) => tracing::info!("gambit server running"),
        }
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                () = &mut shutdown => {
                    tracing::info!("shutdown requested, no longer accepting");
                    break;
                }
                accepted = self.transport.accept() => match accepted {
                    Ok(conn) => {
                        let state = Arc::clone(&self.state);
                        tokio::spawn(async move {
                            if let Err(e) = handle_connection(conn, state).await {
                                tracing::debug!(error = %e, "connection ended with error");
                            }
                        });
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "accept failed");
                    }
                },
            }
        }

        drop(self.transport);
        self.state.coordinator.shutdown().await?;
        Ok(())
    }
}
