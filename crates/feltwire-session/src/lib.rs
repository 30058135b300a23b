//! Client-side session state for Feltwire.
//!
//! This crate holds everything the client knows about its standing with
//! the server:
//!
//! 1. **Phase** — where the handshake currently is ([`ConnectionPhase`])
//! 2. **Records** — identity, matchmaking, active match
//!    ([`SessionTracker`])
//! 3. **Identity** — the injected capability that supplies the address
//!    to authenticate with ([`IdentityProvider`])
//!
//! # How it fits in the stack
//!
//! ```text
//! Client core (above)  ← mutates the tracker from its single actor task
//!     ↕
//! Session layer (this crate)  ← owns the records, publishes snapshots
//!     ↕
//! Protocol layer (below)  ← provides the id and table-type vocabulary
//! ```

mod error;
mod identity;
mod session;
mod tracker;

pub use error::PreconditionError;
pub use identity::{IdentityProvider, StaticIdentity};
pub use session::{
    ClientSnapshot, ConnectionPhase, GameSession, MatchmakingTicket, Session,
};
pub use tracker::SessionTracker;
