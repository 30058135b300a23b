//! The connection manager: a single actor task owning the socket, the
//! handshake phase, the session tracker, and both timers.
//!
//! Everything funnels through one `tokio::select!` loop:
//!
//! - commands posted by the [`TableClient`](crate::TableClient) handle
//! - inbound frames from the socket (when one exists)
//! - the keepalive timer (armed while connected)
//! - the retry timer (armed after an unexpected loss)
//! - the shutdown signal
//!
//! Because one task owns all mutable state, there is no locking anywhere
//! in the client: operations and inbound messages interleave in exactly
//! the order the loop observes them. After every step the manager
//! publishes a [`ClientSnapshot`] on a watch channel, which is what the
//! handle's accessors and the wait primitive read.

use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, info, warn};

use feltwire_protocol::{
    unix_timestamp_secs, ClientMessage, Codec, Inbound, TableType,
};
use feltwire_session::{
    ClientSnapshot, ConnectionPhase, PreconditionError, SessionTracker,
};
use feltwire_timing::{KeepaliveTimer, RetryTimer};
use feltwire_transport::{Connector, Socket};

use crate::config::ClientConfig;
use crate::dispatch;
use crate::event::EventSink;

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

/// An operation posted by the handle. One variant per public operation.
#[derive(Debug)]
pub(crate) enum Command {
    Connect,
    Disconnect,
    Authenticate { public_address: String },
    RequestMatch { table_type: TableType },
    CancelMatchmaking,
    CardAction { action: String, data: serde_json::Value },
    BettingAction { action: String, amount: u64 },
    LockIn,
    RelicSelection { relic_index: u32, joker_plus: bool },
    DelegationReady { delegation_id: String },
    Heartbeat,
}

impl Command {
    fn name(&self) -> &'static str {
        match self {
            Self::Connect => "connect",
            Self::Disconnect => "disconnect",
            Self::Authenticate { .. } => "authenticate",
            Self::RequestMatch { .. } => "request_match",
            Self::CancelMatchmaking => "cancel_matchmaking",
            Self::CardAction { .. } => "card_action",
            Self::BettingAction { .. } => "betting_action",
            Self::LockIn => "lock_in",
            Self::RelicSelection { .. } => "relic_selection",
            Self::DelegationReady { .. } => "delegation_ready",
            Self::Heartbeat => "heartbeat",
        }
    }
}

/// What one pass of the select loop observed. The select arms only
/// build these; all handling happens afterwards, with no borrows held.
enum Step<E> {
    Command(Option<Command>),
    Inbound(Result<Option<String>, E>),
    HeartbeatDue,
    RetryDue,
    Shutdown,
}

/// Receives from the socket when there is one; pends forever otherwise,
/// so the branch simply never wins the select while disconnected.
async fn recv_or_pend<S: Socket>(
    socket: &mut Option<S>,
) -> Result<Option<String>, S::Error> {
    match socket.as_mut() {
        Some(socket) => socket.recv().await,
        None => std::future::pending().await,
    }
}

// ---------------------------------------------------------------------------
// ConnectionManager
// ---------------------------------------------------------------------------

pub(crate) struct ConnectionManager<C: Connector, K: Codec> {
    connector: C,
    codec: K,
    config: ClientConfig,
    cmd_rx: mpsc::UnboundedReceiver<Command>,
    shutdown_rx: oneshot::Receiver<()>,
    events: EventSink,
    snapshot_tx: watch::Sender<ClientSnapshot>,
    socket: Option<C::Socket>,
    phase: ConnectionPhase,
    tracker: SessionTracker,
    heartbeat: KeepaliveTimer,
    retry: RetryTimer,
}

impl<C: Connector, K: Codec> ConnectionManager<C, K> {
    pub(crate) fn new(
        connector: C,
        codec: K,
        config: ClientConfig,
        cmd_rx: mpsc::UnboundedReceiver<Command>,
        shutdown_rx: oneshot::Receiver<()>,
        events: EventSink,
        snapshot_tx: watch::Sender<ClientSnapshot>,
    ) -> Self {
        let heartbeat = KeepaliveTimer::new(config.heartbeat_interval);
        let retry = RetryTimer::new(config.reconnect_delay);
        Self {
            connector,
            codec,
            config,
            cmd_rx,
            shutdown_rx,
            events,
            snapshot_tx,
            socket: None,
            phase: ConnectionPhase::Disconnected,
            tracker: SessionTracker::new(),
            heartbeat,
            retry,
        }
    }

    /// The actor loop. Exits on shutdown or when every handle is gone.
    pub(crate) async fn run(mut self) {
        debug!(url = %self.config.url(), "connection manager started");
        loop {
            let step = tokio::select! {
                cmd = self.cmd_rx.recv() => Step::Command(cmd),
                _ = &mut self.shutdown_rx => Step::Shutdown,
                inbound = recv_or_pend(&mut self.socket) => {
                    Step::Inbound(inbound)
                }
                () = self.heartbeat.due() => Step::HeartbeatDue,
                () = self.retry.due() => Step::RetryDue,
            };

            let done = matches!(&step, Step::Command(None) | Step::Shutdown);
            match step {
                Step::Command(None) | Step::Shutdown => {
                    self.teardown(false, Some("client shut down".into())).await;
                }
                Step::Command(Some(cmd)) => self.handle_command(cmd).await,
                Step::Inbound(Ok(Some(frame))) => self.handle_frame(&frame),
                Step::Inbound(Ok(None)) => {
                    self.handle_connection_lost("connection closed by server".into())
                        .await;
                }
                Step::Inbound(Err(err)) => {
                    self.handle_connection_lost(format!("receive failed: {err}"))
                        .await;
                }
                Step::HeartbeatDue => self.handle_heartbeat_due().await,
                Step::RetryDue => self.handle_retry_due().await,
            }

            self.publish();
            if done {
                break;
            }
        }
        debug!("connection manager exited");
    }

    // -- Commands ---------------------------------------------------------

    async fn handle_command(&mut self, cmd: Command) {
        let name = cmd.name();
        if let Err(violation) = self.check_precondition(&cmd) {
            // State violations are logged no-ops, never surfaced as
            // failures to the caller.
            warn!(operation = name, %violation, "operation rejected");
            return;
        }

        match cmd {
            Command::Connect => self.connect().await,
            Command::Disconnect => {
                info!("disconnect requested");
                self.teardown(false, None).await;
            }
            Command::Authenticate { public_address } => {
                self.send_message(ClientMessage::Authentication {
                    public_address,
                    timestamp: unix_timestamp_secs(),
                })
                .await;
            }
            Command::RequestMatch { table_type } => {
                let Some(player_id) = self.tracker.player_id().cloned() else {
                    return;
                };
                self.tracker.start_matchmaking(table_type);
                self.events.emit(crate::ClientEvent::MatchmakingStarted {
                    table_type,
                });
                self.send_message(ClientMessage::RequestMatch {
                    table_type,
                    player_id,
                })
                .await;
            }
            Command::CancelMatchmaking => {
                let Some(player_id) = self.tracker.player_id().cloned() else {
                    return;
                };
                let Some(ticket) = self.tracker.take_matchmaking() else {
                    return;
                };
                self.events.emit(crate::ClientEvent::MatchmakingCancelled);
                self.send_message(ClientMessage::CancelMatch {
                    player_id,
                    table_type: ticket.table_type,
                })
                .await;
            }
            Command::CardAction { action, data } => {
                let Some(game_session_id) =
                    self.tracker.game_session_id().cloned()
                else {
                    return;
                };
                self.send_message(ClientMessage::CardAction {
                    game_session_id,
                    action,
                    data,
                })
                .await;
            }
            Command::BettingAction { action, amount } => {
                let Some(game_session_id) =
                    self.tracker.game_session_id().cloned()
                else {
                    return;
                };
                self.send_message(ClientMessage::BettingAction {
                    game_session_id,
                    action,
                    amount,
                })
                .await;
            }
            Command::LockIn => {
                let Some(game_session_id) =
                    self.tracker.game_session_id().cloned()
                else {
                    return;
                };
                self.send_message(ClientMessage::LockIn { game_session_id })
                    .await;
            }
            Command::RelicSelection {
                relic_index,
                joker_plus,
            } => {
                let Some(game_session_id) =
                    self.tracker.game_session_id().cloned()
                else {
                    return;
                };
                self.send_message(ClientMessage::RelicSelection {
                    game_session_id,
                    relic_index,
                    joker_plus,
                })
                .await;
            }
            Command::DelegationReady { delegation_id } => {
                let (Some(game_session_id), Some(player_id)) = (
                    self.tracker.game_session_id().cloned(),
                    self.tracker.player_id().cloned(),
                ) else {
                    return;
                };
                self.send_message(ClientMessage::DelegationReady {
                    game_session_id,
                    player_id,
                    delegation_id,
                })
                .await;
            }
            Command::Heartbeat => {
                self.send_message(ClientMessage::Heartbeat).await;
            }
        }
    }

    /// The state gate for each operation, checked before any side effect.
    fn check_precondition(&self, cmd: &Command) -> Result<(), PreconditionError> {
        let phase = self.phase;
        match cmd {
            Command::Connect => {
                if phase == ConnectionPhase::Disconnected {
                    Ok(())
                } else {
                    Err(PreconditionError::AlreadyConnected)
                }
            }
            // Teardown from any state is always legal.
            Command::Disconnect => Ok(()),
            Command::Authenticate { .. } => {
                if !phase.is_connected() {
                    Err(PreconditionError::NotConnected)
                } else if !phase.is_established() {
                    Err(PreconditionError::NotEstablished)
                } else {
                    Ok(())
                }
            }
            Command::RequestMatch { .. } => {
                if !phase.is_established() {
                    Err(PreconditionError::NotEstablished)
                } else if !phase.is_authenticated() {
                    Err(PreconditionError::NotAuthenticated)
                } else if self.tracker.is_in_matchmaking() {
                    Err(PreconditionError::AlreadyInMatchmaking)
                } else {
                    Ok(())
                }
            }
            Command::CancelMatchmaking => {
                if !phase.is_authenticated() {
                    Err(PreconditionError::NotAuthenticated)
                } else if !self.tracker.is_in_matchmaking() {
                    Err(PreconditionError::NotInMatchmaking)
                } else {
                    Ok(())
                }
            }
            Command::CardAction { .. }
            | Command::BettingAction { .. }
            | Command::LockIn
            | Command::RelicSelection { .. }
            | Command::DelegationReady { .. } => {
                if !phase.is_authenticated() {
                    Err(PreconditionError::NotAuthenticated)
                } else if self.tracker.game().is_none() {
                    Err(PreconditionError::NoActiveGame)
                } else {
                    Ok(())
                }
            }
            Command::Heartbeat => {
                if phase.is_connected() {
                    Ok(())
                } else {
                    Err(PreconditionError::NotConnected)
                }
            }
        }
    }

    // -- Connection lifecycle ---------------------------------------------

    /// Dials the server. On success the socket is installed and the
    /// keepalive armed; on failure the loss path runs (one retry gets
    /// scheduled).
    async fn connect(&mut self) {
        self.phase = ConnectionPhase::Connecting;
        info!(url = %self.config.url(), "dialing");

        match self.connector.connect().await {
            Ok(socket) => {
                debug!(socket = %socket.id(), "socket open");
                self.socket = Some(socket);
                self.tracker.clear_all();
                self.phase = ConnectionPhase::Connected;
                self.heartbeat.arm();
                self.retry.disarm();
                self.events.emit(crate::ClientEvent::Connected);
            }
            Err(err) => {
                warn!(error = %err, "dial failed");
                self.phase = ConnectionPhase::Disconnected;
                self.tracker.clear_all();
                self.heartbeat.disarm();
                self.retry.arm();
                self.events
                    .emit_disconnected(Some(format!("dial failed: {err}")))
                    .await;
            }
        }
    }

    /// Unexpected loss: tear down and schedule the single retry.
    async fn handle_connection_lost(&mut self, reason: String) {
        info!(%reason, "connection lost");
        self.teardown(true, Some(reason)).await;
    }

    /// Closes the socket (if any), wipes all session state, disarms the
    /// keepalive, and arms or disarms the retry. Emits `Disconnected`
    /// when there was a connection (or pending retry) to tear down.
    async fn teardown(&mut self, schedule_retry: bool, reason: Option<String>) {
        if let Some(mut socket) = self.socket.take() {
            if let Err(err) = socket.close().await {
                debug!(error = %err, "socket close failed");
            }
        }

        self.heartbeat.disarm();
        if schedule_retry {
            self.retry.arm();
        } else {
            // Caller-requested teardown also cancels a pending retry:
            // an explicit disconnect must stay disconnected.
            self.retry.disarm();
        }

        let was_connected = self.phase != ConnectionPhase::Disconnected;
        self.phase = ConnectionPhase::Disconnected;
        self.tracker.clear_all();

        if was_connected {
            self.events.emit_disconnected(reason).await;
        }
    }

    async fn handle_retry_due(&mut self) {
        if self.phase != ConnectionPhase::Disconnected {
            debug!("retry due but already connected — skipped");
            return;
        }
        info!("attempting scheduled reconnect");
        self.connect().await;
    }

    // -- Outbound ---------------------------------------------------------

    async fn handle_heartbeat_due(&mut self) {
        if !self.phase.is_connected() {
            // The keepalive should never outlive the connection; if it
            // does, disarm rather than write to a dead socket.
            self.heartbeat.disarm();
            return;
        }
        self.send_message(ClientMessage::Heartbeat).await;
    }

    /// Encodes and sends one message. A send failure is a connection
    /// loss and runs the full teardown-and-retry path.
    async fn send_message(&mut self, msg: ClientMessage) {
        let tag = msg.type_tag();
        let frame = match self.codec.encode(&msg) {
            Ok(frame) => frame,
            Err(err) => {
                warn!(message = tag, error = %err, "encode failed — message dropped");
                return;
            }
        };

        let result = match self.socket.as_mut() {
            Some(socket) => socket.send(&frame).await,
            None => {
                warn!(message = tag, "no socket — message dropped");
                return;
            }
        };

        match result {
            Ok(()) => debug!(message = tag, "sent"),
            Err(err) => {
                self.handle_connection_lost(format!("send failed: {err}"))
                    .await;
            }
        }
    }

    // -- Inbound ----------------------------------------------------------

    fn handle_frame(&mut self, frame: &str) {
        match self.codec.decode(frame) {
            Ok(Inbound::Message(msg)) => dispatch::dispatch(
                &mut self.phase,
                &mut self.tracker,
                msg,
                &self.events,
            ),
            Ok(Inbound::Unknown { msg_type }) => {
                debug!(%msg_type, "unrecognized message type — ignored");
            }
            Err(err) => {
                // A bad frame is dropped; the connection survives.
                warn!(error = %err, "undecodable frame — dropped");
            }
        }
    }

    // -- Snapshot ---------------------------------------------------------

    fn publish(&self) {
        self.snapshot_tx.send_replace(ClientSnapshot {
            phase: self.phase,
            session: self.tracker.session().cloned(),
            matchmaking: self.tracker.matchmaking().cloned(),
            game: self.tracker.game().cloned(),
        });
    }
}
