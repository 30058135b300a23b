//! End-to-end client tests over a scripted in-memory transport.
//!
//! A `MockConnector` hands out pre-built socket halves; the test drives
//! the "server" end of each. All tests run under
//! `tokio::test(start_paused = true)`, so heartbeat and reconnect
//! timing is asserted against virtual time, deterministically.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use serde_json::{json, Value};
use tokio::sync::mpsc;

use feltwire::{
    ClientConfig, ClientEvent, ConnectionPhase, TableClient, TableType,
};
use feltwire_transport::{Connector, Socket, SocketId};

// =========================================================================
// Mock transport
// =========================================================================

#[derive(Debug, thiserror::Error)]
#[error("{0}")]
struct MockError(&'static str);

struct MockSocket {
    id: SocketId,
    to_server: mpsc::UnboundedSender<String>,
    from_server: mpsc::UnboundedReceiver<String>,
}

impl Socket for MockSocket {
    type Error = MockError;

    async fn send(&mut self, frame: &str) -> Result<(), MockError> {
        self.to_server
            .send(frame.to_string())
            .map_err(|_| MockError("server hung up"))
    }

    async fn recv(&mut self) -> Result<Option<String>, MockError> {
        Ok(self.from_server.recv().await)
    }

    async fn close(&mut self) -> Result<(), MockError> {
        Ok(())
    }

    fn id(&self) -> SocketId {
        self.id
    }
}

/// The test's side of one mock connection.
struct ServerEnd {
    to_client: Option<mpsc::UnboundedSender<String>>,
    from_client: mpsc::UnboundedReceiver<String>,
}

impl ServerEnd {
    fn push(&self, frame: Value) {
        if let Some(tx) = &self.to_client {
            let _ = tx.send(frame.to_string());
        }
    }

    /// The next frame the client sent, parsed. Panics after 1s of
    /// virtual time with nothing arriving.
    async fn expect_frame(&mut self) -> Value {
        let frame = tokio::time::timeout(
            Duration::from_secs(1),
            self.from_client.recv(),
        )
        .await
        .expect("client should have sent a frame")
        .expect("client side should still be open");
        serde_json::from_str(&frame).expect("client frames are JSON")
    }

    fn try_frame(&mut self) -> Option<Value> {
        self.from_client
            .try_recv()
            .ok()
            .map(|frame| serde_json::from_str(&frame).expect("JSON frame"))
    }

    /// Simulates the server dropping the connection.
    fn close(&mut self) {
        self.to_client = None;
    }
}

fn pair() -> (MockSocket, ServerEnd) {
    static NEXT_ID: AtomicU64 = AtomicU64::new(0);
    let (to_server, from_client) = mpsc::unbounded_channel();
    let (to_client, from_server) = mpsc::unbounded_channel();
    let socket = MockSocket {
        id: SocketId::new(NEXT_ID.fetch_add(1, Ordering::Relaxed)),
        to_server,
        from_server,
    };
    let server = ServerEnd {
        to_client: Some(to_client),
        from_client,
    };
    (socket, server)
}

/// Hands out scripted dial outcomes in order; dials past the end of the
/// script fail.
struct MockConnector {
    script: Mutex<VecDeque<Result<MockSocket, MockError>>>,
}

impl MockConnector {
    fn new(script: Vec<Result<MockSocket, MockError>>) -> Self {
        Self {
            script: Mutex::new(script.into_iter().collect()),
        }
    }
}

impl Connector for MockConnector {
    type Socket = MockSocket;
    type Error = MockError;

    async fn connect(&self) -> Result<MockSocket, MockError> {
        match self.script.lock() {
            Ok(mut script) => script
                .pop_front()
                .unwrap_or(Err(MockError("no more scripted connections"))),
            Err(_) => Err(MockError("script poisoned")),
        }
    }
}

// =========================================================================
// Helpers
// =========================================================================

fn config() -> ClientConfig {
    ClientConfig::new()
        .with_heartbeat_interval(Duration::from_secs(30))
        .with_reconnect_delay(Duration::from_secs(5))
}

const WAIT: Duration = Duration::from_secs(1);

fn connection_established() -> Value {
    json!({ "type": "connection_established", "connectionId": "c1" })
}

fn auth_success() -> Value {
    json!({
        "type": "authentication_response",
        "status": "success",
        "sessionId": "S1",
        "playerId": "ADDR1",
    })
}

/// Drives connect → established → authenticated over one server end.
async fn bring_up_authenticated(client: &TableClient, server: &mut ServerEnd) {
    client.connect();
    client
        .wait_until(WAIT, |s| s.is_connected())
        .await
        .expect("should connect");

    server.push(connection_established());
    client
        .wait_until(WAIT, |s| s.is_established())
        .await
        .expect("should establish");

    client.authenticate("ADDR1");
    let frame = server.expect_frame().await;
    assert_eq!(frame["type"], "authentication");

    server.push(auth_success());
    client
        .wait_until(WAIT, |s| s.is_authenticated())
        .await
        .expect("should authenticate");
}

fn drain_events(rx: &mut mpsc::Receiver<ClientEvent>) -> Vec<ClientEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

// =========================================================================
// Handshake and matchmaking
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_full_handshake_and_match_flow() {
    let (socket, mut server) = pair();
    let (client, mut events) =
        TableClient::start(MockConnector::new(vec![Ok(socket)]), config());

    client.connect();
    client.wait_until(WAIT, |s| s.is_connected()).await.expect("connect");
    assert_eq!(client.phase(), ConnectionPhase::Connected);

    server.push(connection_established());
    client
        .wait_until(WAIT, |s| s.is_established())
        .await
        .expect("establish");

    client.authenticate("ADDR1");
    let frame = server.expect_frame().await;
    assert_eq!(frame["type"], "authentication");
    assert_eq!(frame["publicAddress"], "ADDR1");
    assert!(frame["timestamp"].is_u64(), "authentication is timestamped");

    server.push(auth_success());
    client
        .wait_until(WAIT, |s| s.is_authenticated())
        .await
        .expect("authenticate");
    let session = client.session().expect("session should be live");
    assert_eq!(session.session_id.as_str(), "S1");
    assert_eq!(session.player_id.as_str(), "ADDR1");

    client.request_match(TableType::Small);
    let frame = server.expect_frame().await;
    assert_eq!(
        frame,
        json!({
            "type": "request_match",
            "tableType": "small",
            "playerId": "ADDR1",
        }),
        "request_match carries no timestamp or session id"
    );
    assert!(client.is_in_matchmaking());

    server.push(json!({
        "type": "match_found",
        "gameSessionId": "G1",
        "player1": "ADDR1",
        "player2": "ADDR2",
        "tableType": "small",
        "playInAmount": 200_000_000u64,
    }));
    client
        .wait_until(WAIT, |s| s.game.is_some())
        .await
        .expect("match");

    let game = client.game().expect("game should be live");
    assert_eq!(game.game_session_id.as_str(), "G1");
    assert_eq!(game.opponent.as_str(), "ADDR2");
    assert_eq!(game.play_in_amount, 200_000_000);
    assert!(!client.is_in_matchmaking(), "match fulfils the request");

    let seen = drain_events(&mut events);
    assert!(seen.contains(&ClientEvent::Connected));
    assert!(seen.contains(&ClientEvent::ConnectionEstablished {
        connection_id: "c1".into()
    }));
    assert!(seen.iter().any(|e| matches!(e, ClientEvent::MatchFound { .. })));
}

#[tokio::test(start_paused = true)]
async fn test_duplicate_request_match_sends_one_frame() {
    let (socket, mut server) = pair();
    let (client, _events) =
        TableClient::start(MockConnector::new(vec![Ok(socket)]), config());
    bring_up_authenticated(&client, &mut server).await;

    client.request_match(TableType::Medium);
    client.request_match(TableType::Medium);
    client
        .wait_until(WAIT, |s| s.is_in_matchmaking())
        .await
        .expect("first request should register");

    let frame = server.expect_frame().await;
    assert_eq!(frame["type"], "request_match");
    assert!(
        server.try_frame().is_none(),
        "second request while queued must be a no-op"
    );
}

#[tokio::test(start_paused = true)]
async fn test_cancel_matchmaking_round_trip() {
    let (socket, mut server) = pair();
    let (client, mut events) =
        TableClient::start(MockConnector::new(vec![Ok(socket)]), config());
    bring_up_authenticated(&client, &mut server).await;

    client.request_match(TableType::Big);
    server.expect_frame().await;

    client.cancel_matchmaking();
    let frame = server.expect_frame().await;
    assert_eq!(
        frame,
        json!({
            "type": "cancel_match",
            "playerId": "ADDR1",
            "tableType": "big",
        })
    );
    client
        .wait_until(WAIT, |s| !s.is_in_matchmaking())
        .await
        .expect("cancel should clear the ticket");

    let seen = drain_events(&mut events);
    assert!(seen.contains(&ClientEvent::MatchmakingCancelled));
}

#[tokio::test(start_paused = true)]
async fn test_operations_before_authentication_are_no_ops() {
    let (socket, mut server) = pair();
    let (client, _events) =
        TableClient::start(MockConnector::new(vec![Ok(socket)]), config());

    client.connect();
    client.wait_until(WAIT, |s| s.is_connected()).await.expect("connect");
    server.push(connection_established());
    client
        .wait_until(WAIT, |s| s.is_established())
        .await
        .expect("establish");

    // Not authenticated: nothing may hit the wire, nothing may mutate.
    client.request_match(TableType::Small);
    client.send_lock_in();
    client.send_betting_action("raise", 100);
    tokio::time::sleep(Duration::from_millis(10)).await;

    assert!(server.try_frame().is_none());
    assert!(!client.is_in_matchmaking());
}

#[tokio::test(start_paused = true)]
async fn test_game_actions_carry_the_active_game_session() {
    let (socket, mut server) = pair();
    let (client, _events) =
        TableClient::start(MockConnector::new(vec![Ok(socket)]), config());
    bring_up_authenticated(&client, &mut server).await;

    server.push(json!({
        "type": "match_found",
        "gameSessionId": "G1",
        "player1": "ADDR2",
        "player2": "ADDR1",
        "tableType": "small",
        "playInAmount": 200_000_000u64,
    }));
    client.wait_until(WAIT, |s| s.game.is_some()).await.expect("match");
    assert_eq!(
        client.game().expect("game").opponent.as_str(),
        "ADDR2",
        "opponent is the seat that isn't us"
    );

    client.send_card_action("play", json!({ "cards": [1, 2] }));
    let frame = server.expect_frame().await;
    assert_eq!(frame["type"], "card_action");
    assert_eq!(frame["gameSessionId"], "G1");
    assert_eq!(frame["data"], json!({ "cards": [1, 2] }));

    client.send_lock_in();
    let frame = server.expect_frame().await;
    assert_eq!(frame, json!({ "type": "lock_in", "gameSessionId": "G1" }));

    client.send_betting_action("raise", 500);
    let frame = server.expect_frame().await;
    assert_eq!(frame["type"], "betting_action");
    assert_eq!(frame["amount"], 500);

    client.send_relic_selection(2, true);
    let frame = server.expect_frame().await;
    assert_eq!(frame["type"], "relic_selection");
    assert_eq!(frame["relicIndex"], 2);
    assert_eq!(frame["jokerPlus"], true);

    client.send_delegation_ready("D1");
    let frame = server.expect_frame().await;
    assert_eq!(frame["type"], "delegation_ready");
    assert_eq!(frame["delegationId"], "D1");
    assert_eq!(frame["playerId"], "ADDR1");
}

// =========================================================================
// Heartbeat
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_heartbeats_flow_at_interval_and_stop_on_disconnect() {
    let (socket, mut server) = pair();
    let (client, _events) =
        TableClient::start(MockConnector::new(vec![Ok(socket)]), config());

    client.connect();
    client.wait_until(WAIT, |s| s.is_connected()).await.expect("connect");

    tokio::time::advance(Duration::from_secs(30)).await;
    let frame = server.expect_frame().await;
    assert_eq!(frame, json!({ "type": "heartbeat" }));

    tokio::time::advance(Duration::from_secs(30)).await;
    let frame = server.expect_frame().await;
    assert_eq!(frame, json!({ "type": "heartbeat" }));

    client.disconnect();
    client
        .wait_until(WAIT, |s| s.phase == ConnectionPhase::Disconnected)
        .await
        .expect("disconnect");

    tokio::time::advance(Duration::from_secs(120)).await;
    assert!(
        server.try_frame().is_none(),
        "no heartbeats after disconnect"
    );
}

// =========================================================================
// Reconnection
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_manual_disconnect_does_not_reconnect() {
    let (socket, mut server) = pair();
    let (client, mut events) =
        TableClient::start(MockConnector::new(vec![Ok(socket)]), config());
    bring_up_authenticated(&client, &mut server).await;

    client.disconnect();
    client
        .wait_until(WAIT, |s| s.phase == ConnectionPhase::Disconnected)
        .await
        .expect("disconnect");
    assert!(client.session().is_none(), "teardown wipes the session");

    // Well past the reconnect delay: an intentional disconnect stays
    // disconnected.
    tokio::time::advance(Duration::from_secs(30)).await;
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(client.phase(), ConnectionPhase::Disconnected);

    let seen = drain_events(&mut events);
    let disconnects = seen
        .iter()
        .filter(|e| matches!(e, ClientEvent::Disconnected { .. }))
        .count();
    assert_eq!(disconnects, 1);
}

#[tokio::test(start_paused = true)]
async fn test_unexpected_close_reconnects_once_after_delay() {
    let (socket1, mut server1) = pair();
    let (socket2, mut server2) = pair();
    let (client, mut events) = TableClient::start(
        MockConnector::new(vec![Ok(socket1), Ok(socket2)]),
        config(),
    );
    bring_up_authenticated(&client, &mut server1).await;

    server1.close();
    client
        .wait_until(WAIT, |s| s.phase == ConnectionPhase::Disconnected)
        .await
        .expect("loss should be observed");
    assert!(client.session().is_none(), "session does not survive the socket");

    // Just short of the delay: still down.
    tokio::time::advance(Duration::from_millis(4_900)).await;
    tokio::time::sleep(Duration::from_millis(1)).await;
    assert_eq!(client.phase(), ConnectionPhase::Disconnected);

    // At the delay: the single retry dials.
    client
        .wait_until(Duration::from_secs(1), |s| s.is_connected())
        .await
        .expect("retry should reconnect");

    // The new connection is a fresh handshake.
    server2.push(connection_established());
    client
        .wait_until(WAIT, |s| s.is_established())
        .await
        .expect("fresh handshake on the new socket");

    let seen = drain_events(&mut events);
    assert!(seen.contains(&ClientEvent::Disconnected {
        reason: Some("connection closed by server".into())
    }));
}

#[tokio::test(start_paused = true)]
async fn test_manual_reconnect_cancels_pending_retry() {
    let (socket1, mut server1) = pair();
    let (socket2, _server2) = pair();
    let (client, _events) = TableClient::start(
        MockConnector::new(vec![Ok(socket1), Ok(socket2)]),
        config(),
    );

    client.connect();
    client.wait_until(WAIT, |s| s.is_connected()).await.expect("connect");

    server1.close();
    client
        .wait_until(WAIT, |s| s.phase == ConnectionPhase::Disconnected)
        .await
        .expect("loss should be observed");

    // Reconnect manually before the retry fires.
    client.connect();
    client
        .wait_until(WAIT, |s| s.is_connected())
        .await
        .expect("manual reconnect");

    // If the stale retry were still armed it would dial past the end of
    // the script, fail, and knock the client back to Disconnected.
    tokio::time::advance(Duration::from_secs(30)).await;
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert!(client.is_connected(), "stale retry must be cancelled");
}

#[tokio::test(start_paused = true)]
async fn test_dial_failure_schedules_retry() {
    let (socket, _server) = pair();
    let (client, mut events) = TableClient::start(
        MockConnector::new(vec![Err(MockError("refused")), Ok(socket)]),
        config(),
    );

    client.connect();
    // The failed dial surfaces as a disconnect with the dial error.
    let event = tokio::time::timeout(Duration::from_secs(1), events.recv())
        .await
        .expect("event should arrive")
        .expect("channel open");
    assert!(
        matches!(&event, ClientEvent::Disconnected { reason: Some(r) } if r.contains("refused"))
    );

    client
        .wait_until(Duration::from_secs(6), |s| s.is_connected())
        .await
        .expect("retry should succeed");
}

// =========================================================================
// Server-driven session changes
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_auth_required_error_demotes_but_keeps_connection() {
    let (socket, mut server) = pair();
    let (client, mut events) =
        TableClient::start(MockConnector::new(vec![Ok(socket)]), config());
    bring_up_authenticated(&client, &mut server).await;

    server.push(json!({
        "type": "error",
        "code": "AUTH_REQUIRED",
        "message": "session expired",
    }));
    client
        .wait_until(WAIT, |s| !s.is_authenticated())
        .await
        .expect("demotion should be observed");

    assert_eq!(client.phase(), ConnectionPhase::ConnectionEstablished);
    assert!(client.session().is_none());

    let seen = drain_events(&mut events);
    assert!(seen.iter().any(|e| matches!(
        e,
        ClientEvent::ServerError { code, .. }
            if *code == feltwire::ErrorCode::AuthRequired
    )));
    assert!(seen
        .iter()
        .any(|e| matches!(e, ClientEvent::AuthenticationFailed { .. })));
}

#[tokio::test(start_paused = true)]
async fn test_unknown_message_type_is_ignored() {
    let (socket, mut server) = pair();
    let (client, _events) =
        TableClient::start(MockConnector::new(vec![Ok(socket)]), config());
    bring_up_authenticated(&client, &mut server).await;

    server.push(json!({ "type": "tournament_update", "round": 3 }));
    server.push(json!({ "type": "error", "code": "X", })); // undecodable: no message
    tokio::time::sleep(Duration::from_millis(10)).await;

    // Connection and session survive both frames.
    assert!(client.is_authenticated());
}

// =========================================================================
// Shutdown
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_wait_after_shutdown_reports_closed() {
    let (socket, _server) = pair();
    let (mut client, _events) =
        TableClient::start(MockConnector::new(vec![Ok(socket)]), config());

    client.shutdown().await;

    // The manager is gone, so the wait can never be satisfied; it must
    // resolve with Closed rather than hang or time out.
    let result = client.wait_until(WAIT, |s| s.is_connected()).await;
    assert!(matches!(result, Err(feltwire::FeltwireError::Closed)));
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_emits_final_disconnect() {
    let (socket, mut server) = pair();
    let (mut client, mut events) =
        TableClient::start(MockConnector::new(vec![Ok(socket)]), config());
    bring_up_authenticated(&client, &mut server).await;

    client.shutdown().await;

    let seen = drain_events(&mut events);
    assert!(seen.iter().any(|e| matches!(
        e,
        ClientEvent::Disconnected { reason: Some(r) } if r == "client shut down"
    )));

    // Posting after shutdown is a logged no-op, not a panic.
    client.connect();
}
