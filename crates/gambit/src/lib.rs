//! # Gambit
//!
//! Session coordination server for two-player online chess.
//!
//! Gambit pairs two WebSocket clients in a session identified by a room
//! code, relays moves between them in order, and announces how the game
//! ended (resignation, agreed draw, or a dropped connection). Chess rules
//! are the clients' business: the server never validates a move.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use clap::Parser;
//! use gambit::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), GambitError> {
//!     let config = ServerConfig::from(ServerArgs::parse());
//!     let server = GambitServer::builder().config(config).build().await?;
//!     server.run().await
//! }
//! ```

mod config;
mod error;
mod handler;
mod server;

pub use config::{
    DEFAULT_BIND_ADDR, DEFAULT_COMMAND_BUFFER, DEFAULT_OUTBOUND_BUFFER, ServerArgs, ServerConfig,
};
pub use error::GambitError;
pub use server::{GambitServer, GambitServerBuilder};

/// Everything needed to run a server or talk to one in tests.
pub mod prelude {
    pub use crate::{
        GambitError, GambitServer, GambitServerBuilder, ServerArgs, ServerConfig,
    };
    pub use gambit_protocol::{
        ClientMessage, Codec, Color, EndReason, JsonCodec, MoveRecord, RoomId, ServerMessage,
    };
    pub use gambit_room::{CoordinatorHandle, CoordinatorInfo, SessionError};
    pub use gambit_transport::ConnectionId;
}
