//! # ripple-core
//!
//! Relay core for the Ripple realtime engine.
//!
//! This crate provides the stateful heart of the relay and the fan-out
//! logic around it:
//!
//! - **Registry** - Presence, room membership, and rate-limit state
//! - **Emitter** - Transport seam: emit-to-one and emit-to-room
//! - **MessageStore** - Persistence seam for chat messages
//! - **Relays** - Per-event handlers for chat, social/group, and call signaling
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │  Connection │────▶│   Relays    │────▶│   Emitter   │
//! └─────────────┘     └─────────────┘     └─────────────┘
//!                            │
//!                     ┌──────┴──────┐
//!                     ▼             ▼
//!              ┌────────────┐ ┌──────────────┐
//!              │  Registry  │ │ MessageStore │
//!              └────────────┘ └──────────────┘
//! ```
//!
//! Each inbound event is handled to completion before the next one is read
//! from its connection; the only suspension point is the persistence await
//! in the message relay. Registry maps are only mutated outside that point.

pub mod emit;
pub mod registry;
pub mod relay;
pub mod store;

pub use emit::Emitter;
pub use registry::{Identity, PresenceEntry, Registry};
pub use relay::{CallRelay, MessageRelay, SocialRelay, MALFORMED_NOTICE};
pub use store::{ChatRecord, MessageStore, NullMessageStore, StoreError};
