//! The public client handle.
//!
//! [`TableClient::start`] spawns the connection manager task and returns
//! the handle plus the event stream. The handle is cheap to use from any
//! task: operations post commands onto an unbounded channel (so they
//! never block), and reads come from the snapshot watch channel the
//! manager publishes to.

use std::time::Duration;

use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use feltwire_protocol::{Codec, JsonCodec, TableType};
use feltwire_session::{
    ClientSnapshot, ConnectionPhase, GameSession, IdentityProvider, Session,
};
use feltwire_timing::{wait_until, WaitError};
use feltwire_transport::Connector;

use crate::config::ClientConfig;
use crate::error::FeltwireError;
use crate::event::{ClientEvent, EventSink};
use crate::manager::{Command, ConnectionManager};

/// Handle to a running Feltwire client.
///
/// Operations are fire-and-forget: they post to the connection manager
/// and return immediately. An operation invoked in a state that doesn't
/// permit it is logged and ignored — use the snapshot accessors or
/// [`wait_until`](Self::wait_until) to sequence against state.
///
/// Dropping the handle aborts the manager task; call
/// [`shutdown`](Self::shutdown) for a clean close first.
pub struct TableClient {
    cmd_tx: mpsc::UnboundedSender<Command>,
    snapshot_rx: watch::Receiver<ClientSnapshot>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    shutdown_timeout: Duration,
    task: Option<JoinHandle<()>>,
}

impl TableClient {
    /// Starts a client over the given connector with the JSON wire
    /// format. Returns the handle and the event stream.
    pub fn start<C: Connector>(
        connector: C,
        config: ClientConfig,
    ) -> (Self, mpsc::Receiver<ClientEvent>) {
        Self::start_with_codec(connector, JsonCodec, config)
    }

    /// Starts a client with an explicit codec.
    pub fn start_with_codec<C: Connector, K: Codec>(
        connector: C,
        codec: K,
        config: ClientConfig,
    ) -> (Self, mpsc::Receiver<ClientEvent>) {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) =
            mpsc::channel(config.event_channel_capacity.max(1));
        let (snapshot_tx, snapshot_rx) =
            watch::channel(ClientSnapshot::default());
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let shutdown_timeout = config.shutdown_timeout;

        let manager = ConnectionManager::new(
            connector,
            codec,
            config,
            cmd_rx,
            shutdown_rx,
            EventSink::new(event_tx),
            snapshot_tx,
        );
        let task = tokio::spawn(manager.run());

        let client = Self {
            cmd_tx,
            snapshot_rx,
            shutdown_tx: Some(shutdown_tx),
            shutdown_timeout,
            task: Some(task),
        };
        (client, event_rx)
    }

    // -- Operations -------------------------------------------------------

    /// Dials the server. No-op unless disconnected.
    pub fn connect(&self) {
        self.post(Command::Connect);
    }

    /// Closes the connection and cancels any pending reconnect.
    pub fn disconnect(&self) {
        self.post(Command::Disconnect);
    }

    /// Sends an `authentication` request for the given address. The
    /// outcome arrives as an event and a snapshot change.
    pub fn authenticate(&self, public_address: impl Into<String>) {
        self.post(Command::Authenticate {
            public_address: public_address.into(),
        });
    }

    /// Enters the matchmaking queue for a table tier.
    pub fn request_match(&self, table_type: TableType) {
        self.post(Command::RequestMatch { table_type });
    }

    /// Leaves the matchmaking queue.
    pub fn cancel_matchmaking(&self) {
        self.post(Command::CancelMatchmaking);
    }

    /// Sends an in-game card action with an opaque payload.
    pub fn send_card_action(
        &self,
        action: impl Into<String>,
        data: serde_json::Value,
    ) {
        self.post(Command::CardAction {
            action: action.into(),
            data,
        });
    }

    /// Sends a betting action for the active match.
    pub fn send_betting_action(&self, action: impl Into<String>, amount: u64) {
        self.post(Command::BettingAction {
            action: action.into(),
            amount,
        });
    }

    /// Locks in the current hand.
    pub fn send_lock_in(&self) {
        self.post(Command::LockIn);
    }

    /// Picks a relic during the selection phase.
    pub fn send_relic_selection(&self, relic_index: u32, joker_plus: bool) {
        self.post(Command::RelicSelection {
            relic_index,
            joker_plus,
        });
    }

    /// Signals that delegation to a sub-session authority is complete.
    pub fn send_delegation_ready(&self, delegation_id: impl Into<String>) {
        self.post(Command::DelegationReady {
            delegation_id: delegation_id.into(),
        });
    }

    /// Sends one out-of-schedule heartbeat. The keepalive timer handles
    /// the periodic ones; this exists for callers that want to probe the
    /// connection explicitly.
    pub fn send_heartbeat(&self) {
        self.post(Command::Heartbeat);
    }

    fn post(&self, cmd: Command) {
        if self.cmd_tx.send(cmd).is_err() {
            warn!("client is shut down — operation dropped");
        }
    }

    // -- State ------------------------------------------------------------

    /// A consistent snapshot of the whole client state.
    pub fn snapshot(&self) -> ClientSnapshot {
        self.snapshot_rx.borrow().clone()
    }

    /// Current handshake phase.
    pub fn phase(&self) -> ConnectionPhase {
        self.snapshot_rx.borrow().phase
    }

    /// `true` while the socket is open.
    pub fn is_connected(&self) -> bool {
        self.snapshot_rx.borrow().is_connected()
    }

    /// `true` once the server confirmed readiness.
    pub fn is_connection_established(&self) -> bool {
        self.snapshot_rx.borrow().is_established()
    }

    /// `true` while authenticated.
    pub fn is_authenticated(&self) -> bool {
        self.snapshot_rx.borrow().is_authenticated()
    }

    /// `true` while a matchmaking request is outstanding.
    pub fn is_in_matchmaking(&self) -> bool {
        self.snapshot_rx.borrow().is_in_matchmaking()
    }

    /// The authenticated identity, if any.
    pub fn session(&self) -> Option<Session> {
        self.snapshot_rx.borrow().session.clone()
    }

    /// The active match, if any.
    pub fn game(&self) -> Option<GameSession> {
        self.snapshot_rx.borrow().game.clone()
    }

    /// Waits (bounded) for the client state to satisfy a predicate.
    ///
    /// Resolves immediately if the current snapshot already satisfies
    /// it.
    ///
    /// # Errors
    /// - [`FeltwireError::Wait`] — the timeout elapsed first.
    /// - [`FeltwireError::Closed`] — the client was shut down mid-wait.
    pub async fn wait_until(
        &self,
        timeout: Duration,
        predicate: impl FnMut(&ClientSnapshot) -> bool,
    ) -> Result<(), FeltwireError> {
        let mut rx = self.snapshot_rx.clone();
        wait_until(&mut rx, timeout, predicate)
            .await
            .map_err(|err| match err {
                WaitError::Closed => FeltwireError::Closed,
                other => FeltwireError::Wait(other),
            })
    }

    // -- Sequenced helpers ------------------------------------------------

    /// Authenticates using an injected identity provider, waiting (up to
    /// `timeout`) for the connection to be established first.
    ///
    /// # Errors
    /// - [`FeltwireError::IdentityUnavailable`] — the provider has no
    ///   identity.
    /// - [`FeltwireError::Wait`] — establishment didn't happen in time.
    /// - [`FeltwireError::Closed`] — the client was shut down mid-wait.
    pub async fn authenticate_via(
        &self,
        provider: &dyn IdentityProvider,
        timeout: Duration,
    ) -> Result<(), FeltwireError> {
        if !provider.is_connected() {
            return Err(FeltwireError::IdentityUnavailable);
        }
        let address = provider
            .address()
            .ok_or(FeltwireError::IdentityUnavailable)?;

        self.wait_until(timeout, ClientSnapshot::is_established)
            .await?;
        self.authenticate(address);
        Ok(())
    }

    // -- Shutdown ---------------------------------------------------------

    /// Cleanly shuts the client down: the manager tears the connection
    /// down, emits a final `Disconnected`, and exits. If it doesn't exit
    /// within the configured shutdown timeout the task is aborted.
    pub async fn shutdown(&mut self) {
        if let Some(shutdown_tx) = self.shutdown_tx.take() {
            // An Err here means the manager already exited.
            let _ = shutdown_tx.send(());
        }

        if let Some(mut task) = self.task.take() {
            match tokio::time::timeout(self.shutdown_timeout, &mut task).await {
                Ok(Ok(())) => debug!("client shut down cleanly"),
                Ok(Err(join_err)) => {
                    warn!(error = %join_err, "manager task failed")
                }
                Err(_) => {
                    warn!("manager did not exit in time — aborting");
                    task.abort();
                }
            }
        }
    }
}

impl Drop for TableClient {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
