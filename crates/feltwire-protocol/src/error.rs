//! Error types for the protocol layer.

/// Errors that can occur while encoding or decoding wire messages.
///
/// Decode failures are never fatal to a running client: the dispatch loop
/// logs them and drops the offending message without touching session
/// state.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization of an outbound message failed.
    ///
    /// With the JSON codec this is close to unreachable for catalog
    /// types, but the codec contract surfaces it rather than panicking.
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// An inbound frame was malformed: invalid JSON, or a recognized
    /// `type` whose payload doesn't match its schema.
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// An inbound frame was valid JSON but carried no usable `type`
    /// discriminator, so it can't even be classified as unknown.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}
