//! Error types for the session layer.

/// A public operation was invoked in a state that doesn't permit it.
///
/// Precondition violations are never surfaced to the caller as failures:
/// the connection manager logs the diagnostic and makes the operation a
/// no-op (no message sent, no state change). The typed variants exist so
/// the checks themselves are testable and the logs say exactly which
/// gate failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PreconditionError {
    /// The operation needs an open socket.
    #[error("not connected")]
    NotConnected,

    /// The operation needs the server's `connection_established`.
    #[error("connection not established")]
    NotEstablished,

    /// The operation needs an authenticated session.
    #[error("not authenticated")]
    NotAuthenticated,

    /// `connect()` while a connection already exists or is being dialed.
    #[error("already connected or connecting")]
    AlreadyConnected,

    /// A matchmaking request is already outstanding.
    #[error("matchmaking request already outstanding")]
    AlreadyInMatchmaking,

    /// No matchmaking request to cancel.
    #[error("no outstanding matchmaking request")]
    NotInMatchmaking,

    /// The operation needs an active game session.
    #[error("no active game session")]
    NoActiveGame,
}
