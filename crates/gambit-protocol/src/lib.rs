//! Wire protocol for Gambit.
//!
//! - **Types** ([`ClientMessage`], [`ServerMessage`], [`MoveRecord`],
//!   [`RoomId`], [`Color`], [`EndReason`]) — what travels on the wire.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]) — how those messages are
//!   converted to and from frames.
//! - **Errors** ([`ProtocolError`]).
//!
//! ```text
//! Transport (frames) → Protocol (ClientMessage) → Room (coordination)
//! ```

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{
    ClientMessage, Color, EndReason, MoveRecord, RoomId, ServerMessage,
};
