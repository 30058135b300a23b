//! Inbound message dispatch.
//!
//! One handler per catalog type, each with an explicit state
//! precondition. A message arriving in the wrong phase is logged and
//! ignored — the connection stays up, nothing mutates. All mutation here
//! happens on the manager task's own `phase`/`tracker`, so handlers are
//! plain synchronous functions: no locks, no awaits, message order is
//! mutation order.

use tracing::{debug, info, warn};

use feltwire_protocol::{AuthStatus, ErrorCode, ServerMessage};
use feltwire_session::{ConnectionPhase, GameSession, SessionTracker};

use crate::event::{ClientEvent, EventSink};

/// Routes one decoded server message to its handler.
pub(crate) fn dispatch(
    phase: &mut ConnectionPhase,
    tracker: &mut SessionTracker,
    msg: ServerMessage,
    events: &EventSink,
) {
    match msg {
        ServerMessage::ConnectionEstablished { connection_id } => {
            on_connection_established(phase, connection_id, events);
        }
        ServerMessage::AuthenticationResponse {
            status,
            session_id,
            player_id,
        } => {
            on_authentication_response(
                phase, tracker, status, session_id, player_id, events,
            );
        }
        ServerMessage::MatchFound {
            game_session_id,
            player1,
            player2,
            table_type,
            play_in_amount,
        } => {
            let game = GameSession {
                game_session_id,
                // The server lists both seats; our own id tells us which
                // one is the opponent. Without a session (shouldn't
                // happen for a routed match_found) player1 is assumed.
                opponent: if tracker.player_id() == Some(&player1) {
                    player2
                } else {
                    player1
                },
                table_type,
                play_in_amount,
            };
            on_match_found(tracker, game, events);
        }
        ServerMessage::GameStateUpdate {
            state,
            game_session_id,
            data,
        } => {
            debug!(%state, "game state update");
            events.emit(ClientEvent::GameStateUpdate {
                state,
                game_session_id,
                data,
            });
        }
        ServerMessage::Disconnection { message } => {
            info!(message = message.as_deref(), "opponent disconnected");
            events.emit(ClientEvent::OpponentDisconnected {
                game_session_id: tracker.game_session_id().cloned(),
                message,
            });
        }
        ServerMessage::Error { code, message } => {
            on_server_error(phase, tracker, code, message, events);
        }
    }
}

fn on_connection_established(
    phase: &mut ConnectionPhase,
    connection_id: String,
    events: &EventSink,
) {
    if *phase != ConnectionPhase::Connected {
        warn!(
            ?phase,
            %connection_id,
            "connection_established out of order — ignored"
        );
        return;
    }
    info!(%connection_id, "connection established");
    *phase = ConnectionPhase::ConnectionEstablished;
    events.emit(ClientEvent::ConnectionEstablished { connection_id });
}

fn on_authentication_response(
    phase: &mut ConnectionPhase,
    tracker: &mut SessionTracker,
    status: AuthStatus,
    session_id: Option<feltwire_protocol::SessionId>,
    player_id: Option<feltwire_protocol::PlayerId>,
    events: &EventSink,
) {
    if !phase.is_established() {
        warn!(?phase, "authentication_response before establishment — ignored");
        return;
    }

    if status.is_success() {
        let (Some(session_id), Some(player_id)) = (session_id, player_id)
        else {
            // "success" without the ids it promises. Treat as a failure:
            // a session we can't name is not a session we can use.
            warn!("authentication_response success is missing ids");
            demote(phase, tracker, events, "malformed authentication response");
            return;
        };
        tracker.begin_session(session_id, player_id.clone());
        *phase = ConnectionPhase::Authenticated;
        events.emit(ClientEvent::AuthenticationSucceeded { player_id });
    } else {
        info!("authentication rejected by server");
        demote(phase, tracker, events, "authentication rejected");
    }
}

fn on_match_found(
    tracker: &mut SessionTracker,
    game: GameSession,
    events: &EventSink,
) {
    if !tracker.is_in_matchmaking() {
        // Still honored: the cancel may have raced the match on the
        // server, and the server's word wins.
        debug!(
            game_session_id = %game.game_session_id,
            "match_found without an outstanding request"
        );
    }
    tracker.begin_game(game.clone());
    events.emit(ClientEvent::MatchFound { game });
}

fn on_server_error(
    phase: &mut ConnectionPhase,
    tracker: &mut SessionTracker,
    code: ErrorCode,
    message: String,
    events: &EventSink,
) {
    warn!(%code, %message, "server error");
    events.emit(ClientEvent::ServerError {
        code: code.clone(),
        message: message.clone(),
    });

    if code.clears_authentication() {
        demote(phase, tracker, events, &message);
    }
}

/// Drops the authenticated session while keeping the connection up, and
/// tells the caller why.
fn demote(
    phase: &mut ConnectionPhase,
    tracker: &mut SessionTracker,
    events: &EventSink,
    reason: &str,
) {
    tracker.clear_session();
    if *phase == ConnectionPhase::Authenticated {
        *phase = ConnectionPhase::ConnectionEstablished;
    }
    events.emit(ClientEvent::AuthenticationFailed {
        reason: reason.to_string(),
    });
}

// =========================================================================
// Tests
// =========================================================================
