//! Codec trait and the JSON implementation.
//!
//! A codec converts between the typed catalog and the text frames on the
//! wire. The client core only depends on the [`Codec`] trait, so the wire
//! format could be swapped without touching dispatch or connection
//! management; [`JsonCodec`] is the format the current server speaks.
//!
//! Decoding is two-stage, per the envelope contract:
//!
//! 1. Probe only the `type` discriminator.
//! 2. If the type is in the catalog, re-decode the full payload against
//!    its schema; otherwise classify the frame as [`Inbound::Unknown`].
//!
//! Unknown types are therefore an envelope-level *success* — they are
//! simply never dispatched — while a malformed payload for a recognized
//! type is a [`ProtocolError::Decode`].

use serde::Serialize;

use crate::{ProtocolError, ServerMessage};

/// Result of decoding one inbound frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    /// A recognized, fully decoded server message.
    Message(ServerMessage),
    /// A well-formed envelope whose `type` is not in the catalog.
    Unknown {
        /// The unrecognized `type` tag, for diagnostics.
        msg_type: String,
    },
}

/// Encodes outbound requests and decodes inbound frames.
pub trait Codec: Send + Sync + 'static {
    /// Serializes an outbound message to a wire frame.
    ///
    /// # Errors
    /// Returns [`ProtocolError::Encode`] if serialization fails.
    fn encode<T: Serialize>(&self, msg: &T) -> Result<String, ProtocolError>;

    /// Decodes one inbound frame.
    ///
    /// # Errors
    /// - [`ProtocolError::Decode`] — invalid JSON, or a recognized type
    ///   with a payload that doesn't match its schema.
    /// - [`ProtocolError::InvalidMessage`] — valid JSON without a `type`
    ///   string.
    fn decode(&self, frame: &str) -> Result<Inbound, ProtocolError>;
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] for the JSON wire format (one object per text frame).
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, msg: &T) -> Result<String, ProtocolError> {
        serde_json::to_string(msg).map_err(ProtocolError::Encode)
    }

    fn decode(&self, frame: &str) -> Result<Inbound, ProtocolError> {
        let envelope: serde_json::Value =
            serde_json::from_str(frame).map_err(ProtocolError::Decode)?;

        let msg_type = envelope
            .get("type")
            .and_then(serde_json::Value::as_str)
            .ok_or_else(|| {
                ProtocolError::InvalidMessage(
                    "missing \"type\" discriminator".into(),
                )
            })?;

        if !ServerMessage::is_known_type(msg_type) {
            return Ok(Inbound::Unknown {
                msg_type: msg_type.to_string(),
            });
        }

        serde_json::from_value(envelope)
            .map(Inbound::Message)
            .map_err(ProtocolError::Decode)
    }
}

// =========================================================================
// Tests
// =========================================================================
