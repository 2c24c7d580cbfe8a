//! Session store and coordination service for Gambit.
//!
//! All session state lives in one [`SessionStore`], owned by one actor
//! task. Connection handlers talk to it through a [`CoordinatorHandle`].
//!
//! # Key types
//!
//! - [`Session`] — one match: seats, move log, derived turn
//! - [`SessionStore`] — live sessions plus the channel → room index
//! - [`Coordinator`] — synchronous transition rules for every intent
//! - [`CoordinatorHandle`] / [`spawn_coordinator`] — the actor wrapper

mod coordinator;
mod error;
mod service;
mod session;
mod store;

pub use coordinator::{Coordinator, Outbound};
pub use error::SessionError;
pub use service::{CoordinatorHandle, CoordinatorInfo, ParticipantSender, spawn_coordinator};
pub use session::{MoveRejection, Session, SessionState};
pub use store::SessionStore;
