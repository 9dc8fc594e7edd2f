//! Transport seam for the relay core.
//!
//! The core never talks to sockets directly; it assumes an abstraction of
//! connections identified by stable ids, grouped into named rooms, with
//! emit-to-one and emit-to-room primitives. Both primitives are silent
//! no-ops when the target is absent, which is how offline users miss
//! realtime delivery without the relay checking presence twice.

use ripple_protocol::ServerEvent;

/// Emit primitives provided by the transport layer.
///
/// Emits are synchronous and non-blocking; delivery is queued on the target
/// connection's outbound channel.
pub trait Emitter: Send + Sync {
    /// Emit an event to a single connection. No-op if the connection is gone.
    fn emit(&self, connection_id: &str, event: ServerEvent);

    /// Emit an event to every connection subscribed to a room, excluding
    /// `except_connection` (the sender). No-op if the room is empty.
    fn emit_room(&self, room: &str, except_connection: &str, event: ServerEvent);
}
