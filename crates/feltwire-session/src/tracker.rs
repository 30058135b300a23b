//! The session tracker: the single place client-side protocol state
//! lives.
//!
//! # Concurrency note
//!
//! `SessionTracker` is NOT thread-safe and doesn't need to be: it is
//! owned by the connection manager's actor task and mutated only there —
//! by the dispatcher for inbound messages and by the operation handlers
//! for outbound bookkeeping. Everything else reads the snapshots the
//! manager publishes. Keeping the tracker a plain struct avoids hidden
//! locking and makes the mutation order identical to the message order.

use feltwire_protocol::{GameSessionId, PlayerId, SessionId, TableType};

use crate::{GameSession, MatchmakingTicket, Session};

/// Tracks session identity, matchmaking status, and the active match.
///
/// The tracker deliberately does *not* know the connection phase — that
/// belongs to the connection manager, which combines both into the
/// published [`ClientSnapshot`](crate::ClientSnapshot).
#[derive(Debug, Default)]
pub struct SessionTracker {
    session: Option<Session>,
    matchmaking: Option<MatchmakingTicket>,
    game: Option<GameSession>,
}

impl SessionTracker {
    /// Creates an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    // -- Session ----------------------------------------------------------

    /// Stores the identity from a successful `authentication_response`.
    pub fn begin_session(&mut self, session_id: SessionId, player_id: PlayerId) {
        tracing::info!(%session_id, %player_id, "session established");
        self.session = Some(Session {
            session_id,
            player_id,
        });
    }

    /// Drops the authenticated identity (auth failure, auth-clearing
    /// server error). Matchmaking and game state are left alone; callers
    /// that need a full wipe use [`clear_all`](Self::clear_all).
    pub fn clear_session(&mut self) {
        if self.session.take().is_some() {
            tracing::info!("session cleared");
        }
    }

    /// The authenticated identity, if any.
    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// Our player id, if authenticated.
    pub fn player_id(&self) -> Option<&PlayerId> {
        self.session.as_ref().map(|s| &s.player_id)
    }

    // -- Matchmaking ------------------------------------------------------

    /// Records an outstanding matchmaking request.
    pub fn start_matchmaking(&mut self, table_type: TableType) {
        tracing::debug!(%table_type, "matchmaking started");
        self.matchmaking = Some(MatchmakingTicket { table_type });
    }

    /// Clears the outstanding request, returning the ticket so the
    /// caller can build the `cancel_match` message from it.
    pub fn take_matchmaking(&mut self) -> Option<MatchmakingTicket> {
        self.matchmaking.take()
    }

    /// The outstanding request, if any.
    pub fn matchmaking(&self) -> Option<&MatchmakingTicket> {
        self.matchmaking.as_ref()
    }

    /// `true` while a matchmaking request is outstanding.
    pub fn is_in_matchmaking(&self) -> bool {
        self.matchmaking.is_some()
    }

    // -- Game session -----------------------------------------------------

    /// Enters a match (from `match_found`). Any outstanding matchmaking
    /// ticket is consumed: the request is fulfilled.
    pub fn begin_game(&mut self, game: GameSession) {
        self.matchmaking = None;
        tracing::info!(
            game_session_id = %game.game_session_id,
            opponent = %game.opponent,
            "game session started"
        );
        self.game = Some(game);
    }

    /// The active match, if any.
    pub fn game(&self) -> Option<&GameSession> {
        self.game.as_ref()
    }

    /// The active match id, if any.
    pub fn game_session_id(&self) -> Option<&GameSessionId> {
        self.game.as_ref().map(|g| &g.game_session_id)
    }

    // -- Teardown ---------------------------------------------------------

    /// Wipes everything: session, matchmaking, game. Used on every
    /// disconnect so no record outlives the connection it belongs to.
    pub fn clear_all(&mut self) {
        self.session = None;
        self.matchmaking = None;
        self.game = None;
    }
}

// =========================================================================
// Tests
// =========================================================================
