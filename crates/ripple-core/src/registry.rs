//! Shared relay state: presence, room membership, and rate-limit bookkeeping.
//!
//! All three maps are owned by a single [`Registry`] that is injected into
//! every handler; nothing outside the relay core touches them directly.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::debug;

/// A verified user identity, established once per connection by the token
/// verifier and immutable for the connection's lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    /// User id.
    pub id: String,
    /// Display name.
    pub display_name: String,
}

impl Identity {
    /// Create a new identity.
    #[must_use]
    pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
        }
    }
}

/// The live connection bound to a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresenceEntry {
    /// Connection id of the user's current socket.
    pub connection_id: String,
    /// Cached display name.
    pub display_name: String,
}

/// Shared relay state.
///
/// Invariants:
/// - at most one presence entry per user; a new connection for the same user
///   overwrites (last-connect-wins, no multi-device fan-out)
/// - at most one tracked room per user; joining another room overwrites
/// - rate state is written on every accepted message and never explicitly
///   deleted (stale entries are harmless)
#[derive(Debug, Default)]
pub struct Registry {
    /// user id -> live connection.
    presence: DashMap<String, PresenceEntry>,
    /// user id -> last joined room.
    rooms: DashMap<String, String>,
    /// user id -> last accepted message timestamp (ms).
    rate: DashMap<String, u64>,
}

impl Registry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a verified identity to a connection.
    ///
    /// Returns the displaced entry if the user was already connected.
    pub fn connect(&self, identity: &Identity, connection_id: &str) -> Option<PresenceEntry> {
        let displaced = self.presence.insert(
            identity.id.clone(),
            PresenceEntry {
                connection_id: connection_id.to_string(),
                display_name: identity.display_name.clone(),
            },
        );

        if displaced.is_some() {
            debug!(user = %identity.id, "Presence: existing connection displaced");
        }

        displaced
    }

    /// Evict a user's presence and room state on disconnect.
    ///
    /// Idempotent. The eviction is guarded on the connection id so a stale
    /// disconnect racing a reconnect does not clobber the newer entry.
    pub fn disconnect(&self, user_id: &str, connection_id: &str) {
        let owned = self
            .presence
            .remove_if(user_id, |_, entry| entry.connection_id == connection_id)
            .is_some();

        if owned {
            self.rooms.remove(user_id);
            debug!(user = %user_id, "Presence: user disconnected");
        }
    }

    /// Get the connection id a user is currently reachable on.
    #[must_use]
    pub fn connection_of(&self, user_id: &str) -> Option<String> {
        self.presence.get(user_id).map(|e| e.connection_id.clone())
    }

    /// Get a user's full presence entry.
    #[must_use]
    pub fn presence_of(&self, user_id: &str) -> Option<PresenceEntry> {
        self.presence.get(user_id).map(|e| e.clone())
    }

    /// Check whether a user is currently connected.
    #[must_use]
    pub fn is_present(&self, user_id: &str) -> bool {
        self.presence.contains_key(user_id)
    }

    /// Number of currently connected users.
    #[must_use]
    pub fn online_count(&self) -> usize {
        self.presence.len()
    }

    /// Record a room join. Returns the previously tracked room, if any,
    /// so the caller can drop the stale transport subscription.
    pub fn join_room(&self, user_id: &str, room: &str) -> Option<String> {
        self.rooms
            .insert(user_id.to_string(), room.to_string())
            .filter(|previous| previous != room)
    }

    /// Delete a user's room membership record. Returns the tracked room.
    pub fn leave_room(&self, user_id: &str) -> Option<String> {
        self.rooms.remove(user_id).map(|(_, room)| room)
    }

    /// Get the room a user last joined.
    #[must_use]
    pub fn room_of(&self, user_id: &str) -> Option<String> {
        self.rooms.get(user_id).map(|r| r.clone())
    }

    /// Fixed-window rate check: accept unless the previous accepted message
    /// is closer than `window_ms`. Accepting records `now_ms`.
    pub fn try_accept(&self, user_id: &str, now_ms: u64, window_ms: u64) -> bool {
        match self.rate.entry(user_id.to_string()) {
            Entry::Occupied(mut entry) => {
                if now_ms.saturating_sub(*entry.get()) < window_ms {
                    false
                } else {
                    entry.insert(now_ms);
                    true
                }
            }
            Entry::Vacant(entry) => {
                entry.insert(now_ms);
                true
            }
        }
    }
}
