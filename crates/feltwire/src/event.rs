//! Events the client surfaces to the caller.
//!
//! The connection manager pushes [`ClientEvent`]s onto a bounded channel
//! the caller receives from. Delivery is lossy for everything except the
//! terminal [`ClientEvent::Disconnected`]: if the caller falls behind,
//! dropping a state-update notification is recoverable (the snapshot
//! accessors always have the truth), but dropping the disconnect
//! notification would leave the caller waiting on a dead connection
//! forever. So `Disconnected` is the one event the manager awaits
//! channel space for.

use serde_json::Value;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use feltwire_protocol::{ErrorCode, GameSessionId, PlayerId, TableType};
use feltwire_session::GameSession;

/// A notification from the client to the caller.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    /// The socket opened. The server has not yet confirmed readiness.
    Connected,

    /// The server confirmed logical readiness.
    ConnectionEstablished {
        /// Server-assigned connection identifier.
        connection_id: String,
    },

    /// Authentication succeeded; a session is live.
    AuthenticationSucceeded {
        /// The identity the server registered for us.
        player_id: PlayerId,
    },

    /// Authentication failed or was invalidated by the server.
    AuthenticationFailed {
        /// Human-readable reason.
        reason: String,
    },

    /// A matchmaking request is now outstanding.
    MatchmakingStarted {
        /// The tier we queued for.
        table_type: TableType,
    },

    /// The outstanding matchmaking request was cancelled locally.
    MatchmakingCancelled,

    /// A match was found; the game session is live.
    MatchFound {
        /// The new match context.
        game: GameSession,
    },

    /// An opaque game-state push from the server.
    GameStateUpdate {
        /// Coarse state label.
        state: String,
        /// The match this update belongs to, when the server scopes it.
        game_session_id: Option<GameSessionId>,
        /// State payload, passed through untouched.
        data: Value,
    },

    /// The opponent's connection dropped.
    OpponentDisconnected {
        /// The active match at the time of the notification, if any.
        game_session_id: Option<GameSessionId>,
        /// Server-provided description, if any.
        message: Option<String>,
    },

    /// A server-reported application error.
    ServerError {
        /// Machine-readable code.
        code: ErrorCode,
        /// Human-readable description.
        message: String,
    },

    /// The connection is down. Terminal for the current connection;
    /// always delivered.
    Disconnected {
        /// Why, when known (`None` for a caller-requested disconnect
        /// with no further detail).
        reason: Option<String>,
    },
}

impl ClientEvent {
    /// A short label for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Connected => "connected",
            Self::ConnectionEstablished { .. } => "connection_established",
            Self::AuthenticationSucceeded { .. } => "authentication_succeeded",
            Self::AuthenticationFailed { .. } => "authentication_failed",
            Self::MatchmakingStarted { .. } => "matchmaking_started",
            Self::MatchmakingCancelled => "matchmaking_cancelled",
            Self::MatchFound { .. } => "match_found",
            Self::GameStateUpdate { .. } => "game_state_update",
            Self::OpponentDisconnected { .. } => "opponent_disconnected",
            Self::ServerError { .. } => "server_error",
            Self::Disconnected { .. } => "disconnected",
        }
    }
}

// ---------------------------------------------------------------------------
// EventSink
// ---------------------------------------------------------------------------

/// The manager's sending half of the event channel, with the delivery
/// policy baked in.
#[derive(Debug, Clone)]
pub(crate) struct EventSink {
    tx: mpsc::Sender<ClientEvent>,
}

impl EventSink {
    pub(crate) fn new(tx: mpsc::Sender<ClientEvent>) -> Self {
        Self { tx }
    }

    /// Emits a non-terminal event. Never blocks: a full channel drops
    /// the event with a warning, a closed channel (caller dropped the
    /// receiver) drops it silently.
    pub(crate) fn emit(&self, event: ClientEvent) {
        let kind = event.kind();
        match self.tx.try_send(event) {
            Ok(()) => debug!(event = kind, "event emitted"),
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!(event = kind, "event channel full — event dropped");
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                debug!(event = kind, "event receiver gone — event dropped");
            }
        }
    }

    /// Emits the terminal `Disconnected` event, waiting for channel
    /// space if necessary.
    pub(crate) async fn emit_disconnected(&self, reason: Option<String>) {
        if self
            .tx
            .send(ClientEvent::Disconnected { reason })
            .await
            .is_err()
        {
            debug!("event receiver gone — disconnect notification dropped");
        }
    }
}
