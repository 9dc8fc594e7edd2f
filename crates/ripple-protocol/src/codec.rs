//! Codec for encoding and decoding Ripple events.
//!
//! Events travel as single JSON text frames over the WebSocket; there is no
//! additional framing layer. Decoding enforces a maximum frame size and
//! rejects unknown event names and malformed payloads, so downstream
//! handlers only ever see well-formed events.

use thiserror::Error;

use crate::events::{ClientEvent, ServerEvent};

/// Maximum accepted frame size (64 KiB).
pub const MAX_FRAME_SIZE: usize = 64 * 1024;

/// Protocol errors that can occur during encoding/decoding.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Frame exceeds the configured maximum size.
    #[error("Frame size {0} exceeds maximum {1}")]
    FrameTooLarge(usize, usize),

    /// JSON encoding error.
    #[error("Encoding error: {0}")]
    Encode(serde_json::Error),

    /// JSON decoding error, unknown event name, or malformed payload.
    #[error("Decoding error: {0}")]
    Decode(serde_json::Error),
}

/// Encode a server event to a JSON text frame.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn encode(event: &ServerEvent) -> Result<String, ProtocolError> {
    serde_json::to_string(event).map_err(ProtocolError::Encode)
}

/// Decode a client event from a JSON text frame.
///
/// # Errors
///
/// Returns an error if the frame is too large, the event name is unknown,
/// or the payload does not match the event's expected shape.
pub fn decode(frame: &str, max_size: usize) -> Result<ClientEvent, ProtocolError> {
    if frame.len() > max_size {
        return Err(ProtocolError::FrameTooLarge(frame.len(), max_size));
    }

    serde_json::from_str(frame).map_err(ProtocolError::Decode)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payloads::{FriendNotice, FriendTarget};

    #[test]
    fn test_encode_decode_roundtrip() {
        let event = ServerEvent::FriendRequest(FriendNotice {
            username: "alice".into(),
            id: "u-1".into(),
        });

        let frame = encode(&event).unwrap();
        assert!(frame.contains(r#""event":"friend:request""#));
        assert!(frame.contains(r#""_id":"u-1""#));

        let inbound = r#"{"event":"friend:request","data":{"receiverId":"u-2"}}"#;
        let decoded = decode(inbound, MAX_FRAME_SIZE).unwrap();
        assert_eq!(
            decoded,
            ClientEvent::FriendRequest(FriendTarget {
                receiver_id: "u-2".into()
            })
        );
    }

    #[test]
    fn test_decode_rejects_oversized_frame() {
        let padding = "x".repeat(MAX_FRAME_SIZE);
        let frame = format!(r#"{{"event":"joinRoom","data":"{padding}"}}"#);

        match decode(&frame, MAX_FRAME_SIZE) {
            Err(ProtocolError::FrameTooLarge(_, _)) => {}
            other => panic!("Expected FrameTooLarge error, got {other:?}"),
        }
    }

    #[test]
    fn test_decode_rejects_malformed_payload() {
        // receiverId missing from friend:request
        let frame = r#"{"event":"friend:request","data":{}}"#;
        assert!(matches!(
            decode(frame, MAX_FRAME_SIZE),
            Err(ProtocolError::Decode(_))
        ));

        // not JSON at all
        assert!(decode("not json", MAX_FRAME_SIZE).is_err());
    }
}
