//! Session types: the records the client keeps about its place in the
//! protocol.
//!
//! Three records, each optional, each with a precise lifetime:
//! - [`Session`] — who we are to the server (valid only while
//!   authenticated)
//! - [`MatchmakingTicket`] — an outstanding matchmaking request (at most
//!   one per connection)
//! - [`GameSession`] — the active match context

use feltwire_protocol::{GameSessionId, PlayerId, SessionId, TableType};

// ---------------------------------------------------------------------------
// ConnectionPhase
// ---------------------------------------------------------------------------

/// Where the connection currently sits in the handshake state machine.
///
/// ```text
/// Disconnected ──connect()──→ Connecting ──socket open──→ Connected
///       ↑                                                     │
///       │                              inbound connection_established
///       │                                                     ▼
///       └──── close / disconnect() ────────────── ConnectionEstablished
///                                                             │
///                                     successful authentication_response
///                                                             ▼
///                                                       Authenticated
/// ```
///
/// The variants are ordered so that the protocol invariant
/// *authenticated ⇒ established ⇒ connected* falls out of `>=`
/// comparisons instead of needing three separate booleans that could
/// drift apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ConnectionPhase {
    /// No socket. The only phase from which a dial may start.
    Disconnected,
    /// A dial is in flight.
    Connecting,
    /// The socket is open; the server has not yet confirmed readiness.
    Connected,
    /// The server sent `connection_established`.
    ConnectionEstablished,
    /// The server accepted our `authentication`.
    Authenticated,
}

impl ConnectionPhase {
    /// Socket open (phase ≥ `Connected`).
    pub fn is_connected(self) -> bool {
        self >= Self::Connected
    }

    /// Server confirmed logical readiness (phase ≥
    /// `ConnectionEstablished`).
    pub fn is_established(self) -> bool {
        self >= Self::ConnectionEstablished
    }

    /// Server accepted our identity.
    pub fn is_authenticated(self) -> bool {
        self == Self::Authenticated
    }
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// The identity the server assigned us after authentication.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Server-issued session id.
    pub session_id: SessionId,
    /// Our player identity (the address we authenticated with).
    pub player_id: PlayerId,
}

/// An outstanding matchmaking request. Cleared by cancellation or by a
/// `match_found`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchmakingTicket {
    /// The tier we queued for.
    pub table_type: TableType,
}

/// The active match context, populated from `match_found`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameSession {
    /// Identifier of the match.
    pub game_session_id: GameSessionId,
    /// The other seated player.
    pub opponent: PlayerId,
    /// The tier the match was made at.
    pub table_type: TableType,
    /// Stake in the smallest currency unit.
    pub play_in_amount: u64,
}

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// A consistent read-only view of the whole client state.
///
/// The connection manager publishes one of these on a watch channel
/// after every mutation; accessors and the wait-for-condition primitive
/// read snapshots instead of reaching into live state.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientSnapshot {
    /// Handshake phase.
    pub phase: ConnectionPhase,
    /// Authenticated identity, if any.
    pub session: Option<Session>,
    /// Outstanding matchmaking request, if any.
    pub matchmaking: Option<MatchmakingTicket>,
    /// Active match, if any.
    pub game: Option<GameSession>,
}

impl ClientSnapshot {
    /// `true` while the socket is open.
    pub fn is_connected(&self) -> bool {
        self.phase.is_connected()
    }

    /// `true` once the server confirmed readiness.
    pub fn is_established(&self) -> bool {
        self.phase.is_established()
    }

    /// `true` while authenticated.
    pub fn is_authenticated(&self) -> bool {
        self.phase.is_authenticated()
    }

    /// `true` while a matchmaking request is outstanding.
    pub fn is_in_matchmaking(&self) -> bool {
        self.matchmaking.is_some()
    }
}

impl Default for ClientSnapshot {
    fn default() -> Self {
        Self {
            phase: ConnectionPhase::Disconnected,
            session: None,
            matchmaking: None,
            game: None,
        }
    }
}
