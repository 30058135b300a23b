//! Transport abstraction layer for Feltwire.
//!
//! Provides the [`Connector`] and [`Socket`] traits that abstract over
//! how the client reaches the table server. The connection manager dials
//! through a `Connector` and then exclusively owns the resulting
//! `Socket` — no other component ever holds a reference to it, which is
//! why the socket methods take `&mut self` and need no interior locking.
//!
//! # Feature Flags
//!
//! - `websocket` (default) — WebSocket transport via `tokio-tungstenite`

#![allow(async_fn_in_trait)]

mod error;
#[cfg(feature = "websocket")]
mod websocket;

pub use error::TransportError;
#[cfg(feature = "websocket")]
pub use websocket::{WebSocketConnector, WebSocketSocket};

use std::fmt;
use std::future::Future;

/// Opaque identifier for one dialed socket.
///
/// Every successful dial produces a socket with a fresh id; ids are never
/// reused, so a reconnect is observably a *new* socket rather than a
/// resurrected old one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SocketId(u64);

impl SocketId {
    /// Creates a `SocketId` from a raw `u64`.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the underlying `u64` value.
    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SocketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sock-{}", self.0)
    }
}

/// Dials the server and produces connected sockets.
///
/// A connector is reusable: the reconnection path calls [`connect`]
/// (Connector::connect) again after every loss, and each call yields a
/// brand-new socket.
pub trait Connector: Send + Sync + 'static {
    /// The socket type produced by this connector.
    type Socket: Socket;
    /// The error type for dial failures.
    type Error: std::error::Error + Send + Sync;

    /// Dials the server and returns a connected socket.
    fn connect(&self) -> impl Future<Output = Result<Self::Socket, Self::Error>> + Send;
}

/// A single connected socket carrying text frames.
pub trait Socket: Send + 'static {
    /// The error type for socket operations.
    type Error: std::error::Error + Send + Sync;

    /// Sends one text frame to the server.
    fn send(&mut self, frame: &str) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Receives the next text frame from the server.
    ///
    /// Returns `Ok(None)` when the connection is cleanly closed.
    fn recv(&mut self) -> impl Future<Output = Result<Option<String>, Self::Error>> + Send;

    /// Closes the socket.
    fn close(&mut self) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Returns the unique identifier for this socket.
    fn id(&self) -> SocketId;
}
