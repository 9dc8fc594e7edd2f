//! # ripple-protocol
//!
//! Wire protocol definitions for the Ripple realtime relay.
//!
//! This crate defines the JSON event contract used between Ripple clients
//! and servers: the inbound and outbound event catalogs, their payload
//! shapes, and the text-frame codec.
//!
//! ## Event catalog
//!
//! - `joinRoom` / `leaveRoom` - Room membership
//! - `new:message` / `new:messageAlert` - Chat relay and notification
//! - `user:typing` / `user:stopTyping` - Typing indicators
//! - `friend:request` / `friend:accept` / `refresh:chat` - Social graph
//! - `group:alert` - Group lifecycle notices
//! - `call:*` / `decline:call` / `ice:candidate` - Call signaling
//!
//! The event names are a compatibility contract and are reproduced exactly.
//!
//! ## Example
//!
//! ```rust
//! use ripple_protocol::{codec, ClientEvent};
//!
//! let frame = r#"{"event":"joinRoom","data":"room-7"}"#;
//! let event = codec::decode(frame, codec::MAX_FRAME_SIZE).unwrap();
//! assert!(matches!(event, ClientEvent::JoinRoom(room) if room == "room-7"));
//! ```

pub mod codec;
pub mod events;
pub mod payloads;

pub use codec::{decode, encode, ProtocolError};
pub use events::{ClientEvent, ServerEvent};
pub use payloads::{
    CallAcceptNotice, CallAnswer, CallAnswerNotice, CallOffer, CallOfferNotice, CallRequest,
    CallRequestNotice, CallTarget, CandidateNotice, DeclineNotice, ErrorNotice, FriendNotice,
    FriendTarget, GroupAlert, GroupAlertKind, IceCandidate, NewMessage, RealtimeMessage, SenderRef,
    TypingNotice, UserRef, TEXT_MESSAGE_KIND,
};
