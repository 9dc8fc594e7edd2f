//! The connection hub.

use dashmap::{DashMap, DashSet};
use ripple_core::Emitter;
use ripple_protocol::ServerEvent;
use tokio::sync::mpsc;
use tracing::{debug, trace};

/// Outbound channel half handed to the WebSocket layer.
pub type ConnectionHandle = mpsc::UnboundedReceiver<ServerEvent>;

/// Connection and room registry for a single relay process.
///
/// Emits are lock-free sends onto per-connection channels; an emit
/// targeting an absent connection id delivers to nobody and reports
/// nothing, by design.
#[derive(Debug, Default)]
pub struct Hub {
    /// connection id -> outbound event channel.
    connections: DashMap<String, mpsc::UnboundedSender<ServerEvent>>,
    /// room id -> subscribed connection ids.
    rooms: DashMap<String, DashSet<String>>,
}

impl Hub {
    /// Create an empty hub.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connection and return the receiving half of its
    /// outbound channel.
    ///
    /// Registering an id that already exists replaces the old channel;
    /// the displaced receiver simply stops yielding events.
    pub fn register(&self, connection_id: &str) -> ConnectionHandle {
        let (tx, rx) = mpsc::unbounded_channel();
        self.connections.insert(connection_id.to_string(), tx);
        debug!(connection = %connection_id, "Hub: connection registered");
        rx
    }

    /// Remove a connection and drop it from every room.
    ///
    /// Idempotent: unregistering an unknown id is a no-op.
    pub fn unregister(&self, connection_id: &str) {
        self.connections.remove(connection_id);

        let mut emptied = Vec::new();
        for entry in self.rooms.iter() {
            entry.value().remove(connection_id);
            if entry.value().is_empty() {
                emptied.push(entry.key().clone());
            }
        }
        for room in emptied {
            self.rooms.remove_if(&room, |_, members| members.is_empty());
        }

        debug!(connection = %connection_id, "Hub: connection unregistered");
    }

    /// Subscribe a connection to a room.
    pub fn join(&self, connection_id: &str, room: &str) {
        self.rooms
            .entry(room.to_string())
            .or_default()
            .insert(connection_id.to_string());
        debug!(connection = %connection_id, room = %room, "Hub: joined room");
    }

    /// Unsubscribe a connection from a room, deleting the room when it
    /// becomes empty.
    pub fn leave(&self, connection_id: &str, room: &str) {
        if let Some(members) = self.rooms.get(room) {
            members.remove(connection_id);
            let now_empty = members.is_empty();
            drop(members);
            if now_empty {
                self.rooms.remove_if(room, |_, members| members.is_empty());
            }
            debug!(connection = %connection_id, room = %room, "Hub: left room");
        }
    }

    /// Number of live connections.
    #[must_use]
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Number of connections subscribed to a room.
    #[must_use]
    pub fn room_size(&self, room: &str) -> usize {
        self.rooms.get(room).map(|m| m.len()).unwrap_or(0)
    }
}

impl Emitter for Hub {
    fn emit(&self, connection_id: &str, event: ServerEvent) {
        if let Some(tx) = self.connections.get(connection_id) {
            trace!(connection = %connection_id, event = event.name(), "Hub: emit");
            // A closed channel means the connection is tearing down; the
            // event is dropped like any other absent-target emit.
            let _ = tx.send(event);
        }
    }

    fn emit_room(&self, room: &str, except_connection: &str, event: ServerEvent) {
        let Some(members) = self.rooms.get(room) else {
            return;
        };

        trace!(room = %room, event = event.name(), "Hub: room emit");
        for member in members.iter() {
            if member.as_str() == except_connection {
                continue;
            }
            if let Some(tx) = self.connections.get(member.as_str()) {
                let _ = tx.send(event.clone());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emit_to_registered_connection() {
        let hub = Hub::new();
        let mut rx = hub.register("conn-1");

        hub.emit("conn-1", ServerEvent::RefreshChat);

        assert_eq!(rx.try_recv().unwrap(), ServerEvent::RefreshChat);
    }

    #[test]
    fn test_emit_to_absent_connection_is_noop() {
        let hub = Hub::new();
        // Must complete without panicking or observable effect
        hub.emit("conn-ghost", ServerEvent::RefreshChat);
        assert_eq!(hub.connection_count(), 0);
    }

    #[test]
    fn test_room_emit_excludes_sender() {
        let hub = Hub::new();
        let mut rx1 = hub.register("conn-1");
        let mut rx2 = hub.register("conn-2");
        let mut rx3 = hub.register("conn-3");
        hub.join("conn-1", "room-1");
        hub.join("conn-2", "room-1");
        // conn-3 never joins

        hub.emit_room("room-1", "conn-1", ServerEvent::RefreshChat);

        assert!(rx1.try_recv().is_err());
        assert_eq!(rx2.try_recv().unwrap(), ServerEvent::RefreshChat);
        assert!(rx3.try_recv().is_err());
    }

    #[test]
    fn test_leave_and_empty_room_cleanup() {
        let hub = Hub::new();
        let _rx = hub.register("conn-1");
        hub.join("conn-1", "room-1");
        assert_eq!(hub.room_size("room-1"), 1);

        hub.leave("conn-1", "room-1");
        assert_eq!(hub.room_size("room-1"), 0);

        // Leaving again is a no-op
        hub.leave("conn-1", "room-1");
    }

    #[test]
    fn test_unregister_drops_room_memberships() {
        let hub = Hub::new();
        let _rx1 = hub.register("conn-1");
        let mut rx2 = hub.register("conn-2");
        hub.join("conn-1", "room-1");
        hub.join("conn-2", "room-1");

        hub.unregister("conn-1");

        assert_eq!(hub.connection_count(), 1);
        assert_eq!(hub.room_size("room-1"), 1);

        hub.emit_room("room-1", "conn-none", ServerEvent::RefreshChat);
        assert_eq!(rx2.try_recv().unwrap(), ServerEvent::RefreshChat);
    }

    #[test]
    fn test_reregister_replaces_channel() {
        let hub = Hub::new();
        let mut old_rx = hub.register("conn-1");
        let mut new_rx = hub.register("conn-1");

        hub.emit("conn-1", ServerEvent::RefreshChat);

        assert!(old_rx.try_recv().is_err());
        assert_eq!(new_rx.try_recv().unwrap(), ServerEvent::RefreshChat);
    }
}
