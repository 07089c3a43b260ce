//! Codec trait and implementations for serializing/deserializing messages.
//!
//! The server never calls `serde_json` directly: the connection handler is
//! generic over a [`Codec`], so a binary format can be slotted in later
//! without touching the dispatch code.

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// Converts wire messages to bytes and back.
///
/// `Send + Sync + 'static` because one codec value is shared by every
/// connection task for the life of the server.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into one frame.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if the value can't be represented.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes one frame.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the bytes are malformed or don't
    /// match `T`.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] that speaks JSON, the format browser clients send.
///
/// ## Example
///
/// ```rust
/// use spinrank_protocol::{ClientAction, Codec, Envelope, JsonCodec};
///
/// let codec = JsonCodec;
/// let frame = br#"{"payload":{"type":"startGame","code":"ABC123"}}"#;
///
/// let envelope: Envelope<ClientAction> = codec.decode(frame).unwrap();
/// assert_eq!(envelope.seq, 0);
/// assert!(matches!(envelope.payload, ClientAction::StartGame { .. }));
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}

#[cfg(all(test, feature = "json"))]
mod tests {
    use super::*;
    use crate::{ClientAction, Envelope, PlayerId, ServerEvent};

    #[test]
    fn test_decode_garbage_returns_decode_error() {
        let result: Result<Envelope<ClientAction>, _> = JsonCodec.decode(b"not json at all");
        assert!(matches!(result, Err(ProtocolError::Decode(_))));
    }

    #[test]
    fn test_encode_server_event_is_utf8_json() {
        let envelope = Envelope {
            seq: 3,
            timestamp: 120,
            payload: ServerEvent::Welcome {
                player_id: PlayerId(9),
            },
        };
        let bytes = JsonCodec.encode(&envelope).unwrap();
        let text = std::str::from_utf8(&bytes).expect("JSON is UTF-8");
        assert!(text.contains(r#""type":"welcome""#));
        assert!(text.contains(r#""playerId":9"#));
    }
}
