//! Core wire types for the Feltwire table protocol.
//!
//! Every message exchanged with the table server is a single JSON object
//! with a `type` string discriminator. This module defines the full
//! catalog: client→server requests ([`ClientMessage`]) and server→client
//! notifications ([`ServerMessage`]), plus the identifier newtypes and
//! enumerations they carry.
//!
//! Field names are camelCase on the wire (`publicAddress`, `tableType`,
//! `gameSessionId`); `type` tags are snake_case (`request_match`,
//! `connection_established`).

use serde::{Deserialize, Serialize};

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A player's identity as known to the server.
///
/// Opaque string — typically a wallet/public address. Newtype wrapper so a
/// player id can't be confused with a session or game-session id even
/// though all three are strings underneath.
///
/// `#[serde(transparent)]` serializes this as the bare string, not as a
/// one-field object.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub String);

impl PlayerId {
    /// Creates a new `PlayerId` from anything string-like.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the raw identity string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A server-assigned session identifier, valid while authenticated.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub String);

impl SessionId {
    /// Creates a new `SessionId` from anything string-like.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the raw session id string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of an active match (one game between two players).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GameSessionId(pub String);

impl GameSessionId {
    /// Creates a new `GameSessionId` from anything string-like.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the raw game-session id string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GameSessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Table types
// ---------------------------------------------------------------------------

/// Matchmaking category. Each tier implies a server-side play-in/pot
/// ceiling that this client does not interpret.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TableType {
    /// Low-stakes table.
    Small,
    /// Mid-stakes table.
    Medium,
    /// High-stakes table.
    Big,
}

impl TableType {
    /// The wire representation of this table type.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Small => "small",
            Self::Medium => "medium",
            Self::Big => "big",
        }
    }
}

impl fmt::Display for TableType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Authentication status
// ---------------------------------------------------------------------------

/// Outcome of an `authentication_response`.
///
/// The server only promises the literal `"success"` for the happy path;
/// any other status string is treated as a failure rather than a decode
/// error, so a new failure spelling can never crash the dispatch loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthStatus {
    /// The server accepted the identity and issued a session.
    Success,
    /// Anything other than `"success"`.
    Failed,
}

impl AuthStatus {
    /// `true` for [`AuthStatus::Success`].
    pub fn is_success(self) -> bool {
        matches!(self, Self::Success)
    }
}

impl Serialize for AuthStatus {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(match self {
            Self::Success => "success",
            Self::Failed => "failed",
        })
    }
}

impl<'de> Deserialize<'de> for AuthStatus {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let status = String::deserialize(deserializer)?;
        Ok(if status == "success" {
            Self::Success
        } else {
            Self::Failed
        })
    }
}

// ---------------------------------------------------------------------------
// Error codes
// ---------------------------------------------------------------------------

/// Server-reported error codes.
///
/// These are opaque strings on the wire. Two of them get special client
/// handling ([`ErrorCode::clears_authentication`]); the rest are surfaced
/// to the caller as-is. Codes this client doesn't know about decode into
/// [`ErrorCode::Other`] so a server upgrade can't break dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ErrorCode {
    /// The operation requires an authenticated session.
    AuthRequired,
    /// The presented public address was rejected.
    InvalidAddress,
    /// The request timestamp was outside the accepted window.
    InvalidTimestamp,
    /// The identity already has a live connection.
    AlreadyConnected,
    /// Unrecognized table type in a matchmaking request.
    InvalidTableType,
    /// The delegation handoff failed.
    DelegationError,
    /// The relic selection was rejected.
    RelicSelectionError,
    /// The card action was rejected.
    CardActionError,
    /// The lock-in was rejected.
    LockInError,
    /// The betting action was rejected.
    BettingActionError,
    /// The message failed server-side validation.
    InvalidFormat,
    /// The server did not recognize the message type.
    UnknownType,
    /// Unspecified server-side failure.
    InternalError,
    /// Any code not in the catalog above, preserved verbatim.
    Other(String),
}

impl ErrorCode {
    /// Codes that invalidate the local session: the server no longer
    /// honors our authentication, so keeping the session would let the
    /// caller issue doomed authenticated operations.
    pub fn clears_authentication(&self) -> bool {
        matches!(self, Self::AuthRequired | Self::InvalidAddress)
    }

    /// The wire representation of this code.
    pub fn as_str(&self) -> &str {
        match self {
            Self::AuthRequired => "AUTH_REQUIRED",
            Self::InvalidAddress => "INVALID_ADDRESS",
            Self::InvalidTimestamp => "INVALID_TIMESTAMP",
            Self::AlreadyConnected => "ALREADY_CONNECTED",
            Self::InvalidTableType => "INVALID_TABLE_TYPE",
            Self::DelegationError => "DELEGATION_ERROR",
            Self::RelicSelectionError => "RELIC_SELECTION_ERROR",
            Self::CardActionError => "CARD_ACTION_ERROR",
            Self::LockInError => "LOCK_IN_ERROR",
            Self::BettingActionError => "BETTING_ACTION_ERROR",
            Self::InvalidFormat => "INVALID_FORMAT",
            Self::UnknownType => "UNKNOWN_TYPE",
            Self::InternalError => "INTERNAL_ERROR",
            Self::Other(code) => code,
        }
    }
}

impl From<String> for ErrorCode {
    fn from(code: String) -> Self {
        match code.as_str() {
            "AUTH_REQUIRED" => Self::AuthRequired,
            "INVALID_ADDRESS" => Self::InvalidAddress,
            "INVALID_TIMESTAMP" => Self::InvalidTimestamp,
            "ALREADY_CONNECTED" => Self::AlreadyConnected,
            "INVALID_TABLE_TYPE" => Self::InvalidTableType,
            "DELEGATION_ERROR" => Self::DelegationError,
            "RELIC_SELECTION_ERROR" => Self::RelicSelectionError,
            "CARD_ACTION_ERROR" => Self::CardActionError,
            "LOCK_IN_ERROR" => Self::LockInError,
            "BETTING_ACTION_ERROR" => Self::BettingActionError,
            "INVALID_FORMAT" => Self::InvalidFormat,
            "UNKNOWN_TYPE" => Self::UnknownType,
            "INTERNAL_ERROR" => Self::InternalError,
            _ => Self::Other(code),
        }
    }
}

impl From<ErrorCode> for String {
    fn from(code: ErrorCode) -> Self {
        code.as_str().to_string()
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Client → server messages
// ---------------------------------------------------------------------------

/// A client→server request.
///
/// `#[serde(tag = "type")]` produces internally tagged JSON, so
/// `ClientMessage::LockIn { .. }` becomes
/// `{ "type": "lock_in", "gameSessionId": "G1" }` — exactly the envelope
/// the server parses.
///
/// Deliberate asymmetry: `heartbeat`, `request_match`, and `cancel_match`
/// carry no `timestamp` (and no session id). The server doesn't require
/// them for these types, and the omission is part of the wire contract —
/// adding the fields would not be a compatible "fix".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum ClientMessage {
    /// Authenticate the caller identity. The timestamp is Unix seconds at
    /// send time; the server rejects stale requests with
    /// `INVALID_TIMESTAMP`.
    Authentication {
        /// Wallet/public address identifying the player.
        public_address: String,
        /// Unix seconds at send time.
        timestamp: u64,
    },

    /// Enter the matchmaking queue for a table tier.
    RequestMatch {
        /// Requested table tier.
        table_type: TableType,
        /// The authenticated player.
        player_id: PlayerId,
    },

    /// Leave the matchmaking queue.
    CancelMatch {
        /// The authenticated player.
        player_id: PlayerId,
        /// The tier of the outstanding request.
        table_type: TableType,
    },

    /// Signal that delegation to a sub-session authority is complete.
    DelegationReady {
        /// The active match.
        game_session_id: GameSessionId,
        /// The authenticated player.
        player_id: PlayerId,
        /// Opaque delegation handle, not interpreted by this client.
        delegation_id: String,
    },

    /// Pick a relic during the selection phase.
    RelicSelection {
        /// The active match.
        game_session_id: GameSessionId,
        /// Index of the chosen relic.
        relic_index: u32,
        /// Whether the joker-plus modifier applies.
        joker_plus: bool,
    },

    /// An in-game card action with an opaque payload.
    CardAction {
        /// The active match.
        game_session_id: GameSessionId,
        /// Action name (e.g. `"play"`, `"discard"`).
        action: String,
        /// Action payload, passed through untouched.
        data: serde_json::Value,
    },

    /// Lock in the current hand.
    LockIn {
        /// The active match.
        game_session_id: GameSessionId,
    },

    /// A betting action for the active match.
    BettingAction {
        /// The active match.
        game_session_id: GameSessionId,
        /// Action name (e.g. `"raise"`, `"call"`).
        action: String,
        /// Bet amount in the smallest currency unit.
        amount: u64,
    },

    /// Keepalive. Type field only, by protocol design.
    Heartbeat,
}

impl ClientMessage {
    /// The wire `type` tag this message serializes with.
    pub fn type_tag(&self) -> &'static str {
        match self {
            Self::Authentication { .. } => "authentication",
            Self::RequestMatch { .. } => "request_match",
            Self::CancelMatch { .. } => "cancel_match",
            Self::DelegationReady { .. } => "delegation_ready",
            Self::RelicSelection { .. } => "relic_selection",
            Self::CardAction { .. } => "card_action",
            Self::LockIn { .. } => "lock_in",
            Self::BettingAction { .. } => "betting_action",
            Self::Heartbeat => "heartbeat",
        }
    }
}

// ---------------------------------------------------------------------------
// Server → client messages
// ---------------------------------------------------------------------------

/// A server→client notification.
///
/// Server messages may carry extra fields (notably `timestamp`) that this
/// catalog doesn't declare; serde ignores unknown fields, so they decode
/// cleanly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum ServerMessage {
    /// The server confirmed logical readiness after the socket opened.
    ConnectionEstablished {
        /// Server-assigned connection identifier.
        connection_id: String,
    },

    /// Outcome of an `authentication` request. Session/player ids are
    /// only present on success.
    AuthenticationResponse {
        /// `"success"` or a failure spelling.
        status: AuthStatus,
        /// Issued session id (success only).
        #[serde(default)]
        session_id: Option<SessionId>,
        /// Echoed player id (success only).
        #[serde(default)]
        player_id: Option<PlayerId>,
    },

    /// A match was found for an outstanding matchmaking request.
    MatchFound {
        /// The new match.
        game_session_id: GameSessionId,
        /// First seated player.
        player1: PlayerId,
        /// Second seated player.
        player2: PlayerId,
        /// Tier the match was made at.
        table_type: TableType,
        /// Stake in the smallest currency unit.
        play_in_amount: u64,
    },

    /// Opaque game-state push for the active match.
    GameStateUpdate {
        /// Coarse state label (e.g. `"dealing"`, `"betting"`).
        state: String,
        /// The match this update belongs to, when the server scopes it.
        #[serde(default)]
        game_session_id: Option<GameSessionId>,
        /// State payload, passed through untouched.
        #[serde(default)]
        data: serde_json::Value,
    },

    /// The opponent's connection dropped. Informational only.
    Disconnection {
        /// Human-readable description.
        #[serde(default)]
        message: Option<String>,
    },

    /// Server-reported application error.
    Error {
        /// Machine-readable code; see [`ErrorCode`].
        code: ErrorCode,
        /// Human-readable description.
        message: String,
    },
}

impl ServerMessage {
    /// Every `type` tag this client dispatches.
    pub const KNOWN_TYPES: &'static [&'static str] = &[
        "connection_established",
        "authentication_response",
        "match_found",
        "game_state_update",
        "disconnection",
        "error",
    ];

    /// Whether `msg_type` names a message this client dispatches.
    ///
    /// Types outside this set decode successfully at the envelope level
    /// but are never routed to a handler.
    pub fn is_known_type(msg_type: &str) -> bool {
        Self::KNOWN_TYPES.contains(&msg_type)
    }
}

// ---------------------------------------------------------------------------
// Time helper
// ---------------------------------------------------------------------------

/// Current wall-clock time as Unix seconds, for stamping outbound
/// `authentication` messages.
///
/// Falls back to 0 if the system clock reads before the epoch; the server
/// will reject such a request with `INVALID_TIMESTAMP`, which is the
/// right outcome for a clock that broken.
pub fn unix_timestamp_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

// =========================================================================
// Tests
// =========================================================================
