//! # ripple-transport
//!
//! Connection hub for the Ripple realtime relay.
//!
//! The hub owns the mapping from connection ids to outbound event channels
//! and the named room membership sets, and implements the relay core's
//! [`Emitter`](ripple_core::Emitter) seam on top of them. Emits are
//! synchronous sends onto unbounded per-connection channels; the WebSocket
//! layer drains those channels into sockets.

pub mod hub;

pub use hub::{ConnectionHandle, Hub};
