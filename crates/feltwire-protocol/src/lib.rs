//! Wire protocol for Feltwire.
//!
//! This crate defines the "language" the client and the table server
//! speak:
//!
//! - **Types** ([`ClientMessage`], [`ServerMessage`], [`TableType`],
//!   [`ErrorCode`], id newtypes) — the JSON message catalog.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]) — conversion between
//!   typed messages and text frames, including the two-stage
//!   type-probing decode that lets unknown message types pass the
//!   envelope without being dispatched.
//! - **Errors** ([`ProtocolError`]) — what can go wrong in between.
//!
//! # Architecture
//!
//! The protocol layer sits between transport (text frames) and the
//! client core (session state, dispatch). It knows nothing about
//! sockets, timers, or connection phases.
//!
//! ```text
//! Transport (frames) → Protocol (typed messages) → Dispatch (state + events)
//! ```

mod codec;
mod error;
mod types;

pub use codec::{Codec, Inbound};
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{
    unix_timestamp_secs, AuthStatus, ClientMessage, ErrorCode, GameSessionId,
    PlayerId, ServerMessage, SessionId, TableType,
};
