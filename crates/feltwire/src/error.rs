//! Top-level error type for the client crate.

use feltwire_protocol::ProtocolError;
use feltwire_timing::WaitError;
use feltwire_transport::TransportError;

/// Errors surfaced by the client's public API.
///
/// Fire-and-forget operations never return errors (state violations are
/// logged no-ops); this type covers the fallible surface — the sequenced
/// helpers and waits.
#[derive(Debug, thiserror::Error)]
pub enum FeltwireError {
    /// A transport-layer failure.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// A wire encode/decode failure.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// A bounded wait ended without its condition holding.
    #[error("wait failed: {0}")]
    Wait(#[from] WaitError),

    /// The identity provider has no identity available.
    #[error("no identity available to authenticate with")]
    IdentityUnavailable,

    /// The client was shut down; the connection manager is gone.
    #[error("client is shut down")]
    Closed,
}
