//! Feltwire — client for the card-table matchmaking and session
//! protocol.
//!
//! The client speaks a JSON-over-WebSocket protocol: a connection
//! handshake (`connect` → `connection_established` → `authentication`),
//! matchmaking (`request_match` / `cancel_match` / `match_found`), and
//! in-match actions (cards, betting, lock-in, relics, delegation). A
//! single background task owns the connection and all protocol state;
//! the [`TableClient`] handle posts operations to it and observes state
//! through snapshots and events.
//!
//! # Quick start
//!
//! ```no_run
//! use std::time::Duration;
//! use feltwire::{ClientConfig, TableClient, TableType};
//! use feltwire_session::StaticIdentity;
//! use feltwire_transport::WebSocketConnector;
//!
//! # async fn run() -> Result<(), feltwire::FeltwireError> {
//! let config = ClientConfig::new().with_host("localhost").with_port(3000);
//! let connector = WebSocketConnector::new(&config.host, config.port);
//! let (client, mut events) = TableClient::start(connector, config);
//!
//! client.connect();
//! let wallet = StaticIdentity::new("ADDR1");
//! client.authenticate_via(&wallet, Duration::from_secs(10)).await?;
//! client
//!     .wait_until(Duration::from_secs(10), |s| s.is_authenticated())
//!     .await?;
//! client.request_match(TableType::Small);
//!
//! while let Some(event) = events.recv().await {
//!     println!("{event:?}");
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Crates
//!
//! - [`feltwire_protocol`] — wire catalog and codec
//! - [`feltwire_transport`] — `Connector`/`Socket` traits, WebSocket impl
//! - [`feltwire_session`] — phase, tracker, identity injection
//! - [`feltwire_timing`] — keepalive/retry timers, wait primitive
//! - `feltwire` (this crate) — connection manager, dispatch, handle

mod client;
mod config;
mod dispatch;
mod error;
mod event;
mod manager;

pub use client::TableClient;
pub use config::ClientConfig;
pub use error::FeltwireError;
pub use event::ClientEvent;

// The vocabulary callers need without depending on the sub-crates
// directly.
pub use feltwire_protocol::{
    ErrorCode, GameSessionId, PlayerId, SessionId, TableType,
};
pub use feltwire_session::{
    ClientSnapshot, ConnectionPhase, GameSession, IdentityProvider,
    MatchmakingTicket, Session, StaticIdentity,
};
pub use feltwire_timing::WaitError;
pub use feltwire_transport::{Connector, Socket, WebSocketConnector};
