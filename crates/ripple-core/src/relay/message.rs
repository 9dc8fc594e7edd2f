//! Chat message relay: rate check, payload shaping, fan-out, persistence.

use std::sync::Arc;

use ripple_protocol::{
    NewMessage, RealtimeMessage, SenderRef, ServerEvent, TypingNotice, TEXT_MESSAGE_KIND,
};
use tracing::{debug, warn};

use super::MALFORMED_NOTICE;
use crate::emit::Emitter;
use crate::registry::{Identity, Registry};
use crate::store::{ChatRecord, MessageStore};

/// Notice sent when a message arrives inside the rate-limit window.
pub const RATE_LIMIT_NOTICE: &str = "You are sending messages too quickly. Please wait.";

/// Notice sent when the durable store rejects a write.
pub const PERSIST_FAILURE_NOTICE: &str = "Failed to process message";

/// Relay for `new:message` and typing indicators.
pub struct MessageRelay {
    registry: Arc<Registry>,
    store: Arc<dyn MessageStore>,
    window_ms: u64,
}

impl MessageRelay {
    /// Create a new message relay with the given rate-limit window.
    #[must_use]
    pub fn new(registry: Arc<Registry>, store: Arc<dyn MessageStore>, window_ms: u64) -> Self {
        Self {
            registry,
            store,
            window_ms,
        }
    }

    /// Handle an inbound chat message.
    ///
    /// Delivery and durability are decoupled: recipients receive the
    /// realtime payload before the persistence call resolves, and a
    /// persistence failure never retracts it. The persistence await is the
    /// handler's only suspension point.
    pub async fn handle_message(
        &self,
        emitter: &dyn Emitter,
        sender: &Identity,
        connection_id: &str,
        inbound: NewMessage,
        now_ms: u64,
    ) {
        if !self.registry.try_accept(&sender.id, now_ms, self.window_ms) {
            debug!(user = %sender.id, "Message rejected by rate limiter");
            emitter.emit(connection_id, ServerEvent::error(RATE_LIMIT_NOTICE));
            return;
        }

        let valid = if inbound.is_group {
            inbound.group.is_some()
        } else {
            inbound.receiver.is_some()
        };
        if !valid {
            emitter.emit(connection_id, ServerEvent::error(MALFORMED_NOTICE));
            return;
        }

        let record = ChatRecord {
            sender: sender.id.clone(),
            receiver: if inbound.is_group {
                None
            } else {
                inbound.receiver.as_ref().map(|r| r.id.clone())
            },
            group: if inbound.is_group {
                inbound.group.clone()
            } else {
                None
            },
            message: inbound.message.clone(),
            kind: inbound.kind.clone(),
            is_group: inbound.is_group,
            created_at: now_ms,
        };

        let payload = RealtimeMessage {
            client_message_id: inbound.client_message_id,
            sender: SenderRef {
                username: sender.display_name.clone(),
                id: sender.id.clone(),
            },
            receiver: if inbound.is_group {
                None
            } else {
                inbound.receiver
            },
            group: record.group.clone(),
            message: inbound.message,
            media: inbound.media,
            kind: inbound.kind,
            is_group: inbound.is_group,
            created_at: now_ms,
        };

        if inbound.is_group {
            // Broadcast targets the sender's tracked room, not the group id:
            // a sender who never joined a room broadcasts to nobody while the
            // listed members still get alerts.
            if let Some(room) = self.registry.room_of(&sender.id) {
                emitter.emit_room(&room, connection_id, ServerEvent::NewMessage(payload.clone()));
            }
            for member in &inbound.members {
                if member == &sender.id {
                    continue;
                }
                if let Some(target) = self.registry.connection_of(member) {
                    emitter.emit(&target, ServerEvent::NewMessageAlert(payload.clone()));
                }
            }
        } else if let Some(receiver) = payload.receiver.as_ref() {
            if let Some(target) = self.registry.connection_of(&receiver.id) {
                emitter.emit(&target, ServerEvent::NewMessage(payload.clone()));
                emitter.emit(&target, ServerEvent::NewMessageAlert(payload.clone()));
            }
        }

        if record.kind == TEXT_MESSAGE_KIND {
            if let Err(e) = self.store.persist(&record).await {
                warn!(user = %sender.id, error = %e, "Message persistence failed");
                emitter.emit(connection_id, ServerEvent::error(PERSIST_FAILURE_NOTICE));
            }
        }
    }

    /// Relay a typing indicator under the same event name it arrived on.
    pub fn handle_typing(
        &self,
        emitter: &dyn Emitter,
        sender: &Identity,
        connection_id: &str,
        notice: &TypingNotice,
        stopped: bool,
    ) {
        let event = if stopped {
            ServerEvent::StopTyping(sender.display_name.clone())
        } else {
            ServerEvent::Typing(sender.display_name.clone())
        };

        if notice.is_group {
            if let Some(room) = self.registry.room_of(&sender.id) {
                emitter.emit_room(&room, connection_id, event);
            }
        } else if let Some(receiver) = notice.receiver_id.as_deref() {
            if let Some(target) = self.registry.connection_of(receiver) {
                emitter.emit(&target, event);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relay::support::{RecordingEmitter, RecordingStore};
    use ripple_protocol::UserRef;

    const WINDOW: u64 = 2000;

    fn alice() -> Identity {
        Identity::new("u-alice", "alice")
    }

    fn setup() -> (Arc<Registry>, Arc<RecordingStore>, MessageRelay) {
        let registry = Arc::new(Registry::new());
        let store = Arc::new(RecordingStore::new());
        let relay = MessageRelay::new(registry.clone(), store.clone(), WINDOW);
        (registry, store, relay)
    }

    fn direct_text(receiver: &str) -> NewMessage {
        NewMessage {
            client_message_id: Some("m-1".into()),
            message: Some("hello".into()),
            receiver: Some(UserRef::new(receiver)),
            is_group: false,
            group: None,
            kind: "text".into(),
            media: None,
            members: vec![],
        }
    }

    fn group_text(group: &str, members: &[&str]) -> NewMessage {
        NewMessage {
            client_message_id: None,
            message: Some("hello all".into()),
            receiver: None,
            is_group: true,
            group: Some(group.into()),
            kind: "text".into(),
            media: None,
            members: members.iter().map(|m| (*m).to_string()).collect(),
        }
    }

    #[tokio::test]
    async fn test_direct_message_delivers_payload_and_alert() {
        let (registry, store, relay) = setup();
        let emitter = RecordingEmitter::new();
        registry.connect(&alice(), "conn-a");
        registry.connect(&Identity::new("u-bob", "bob"), "conn-b");

        relay
            .handle_message(&emitter, &alice(), "conn-a", direct_text("u-bob"), 1_000)
            .await;

        let to_bob = emitter.to_connection("conn-b");
        assert_eq!(to_bob.len(), 2);
        assert!(matches!(&to_bob[0], ServerEvent::NewMessage(p) if !p.is_group));
        assert!(matches!(&to_bob[1], ServerEvent::NewMessageAlert(_)));

        // Sender observes nothing
        assert!(emitter.to_connection("conn-a").is_empty());

        // Persisted with the receiver id only
        let records = store.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].receiver.as_deref(), Some("u-bob"));
        assert!(records[0].group.is_none());
        assert_eq!(records[0].created_at, 1_000);
    }

    #[tokio::test]
    async fn test_group_message_fan_out() {
        let (registry, store, relay) = setup();
        let emitter = RecordingEmitter::new();
        registry.connect(&alice(), "conn-a");
        registry.connect(&Identity::new("u-bob", "bob"), "conn-b");
        registry.connect(&Identity::new("u-carol", "carol"), "conn-c");
        registry.join_room("u-alice", "g-1");
        registry.join_room("u-bob", "g-1");
        // carol is online but elsewhere

        relay
            .handle_message(
                &emitter,
                &alice(),
                "conn-a",
                group_text("g-1", &["u-alice", "u-bob", "u-carol"]),
                1_000,
            )
            .await;

        // Room broadcast, sender excluded
        let broadcast = emitter.to_room("g-1");
        assert_eq!(broadcast.len(), 1);
        assert!(matches!(&broadcast[0], ServerEvent::NewMessage(p) if p.is_group));

        // Alerts to both other members, not to the sender
        assert_eq!(emitter.to_connection("conn-b").len(), 1);
        assert_eq!(emitter.to_connection("conn-c").len(), 1);
        assert!(emitter.to_connection("conn-a").is_empty());

        let records = store.records();
        assert_eq!(records[0].group.as_deref(), Some("g-1"));
        assert!(records[0].receiver.is_none());
    }

    #[tokio::test]
    async fn test_absent_receiver_is_silent_noop() {
        let (registry, store, relay) = setup();
        let emitter = RecordingEmitter::new();
        registry.connect(&alice(), "conn-a");

        relay
            .handle_message(&emitter, &alice(), "conn-a", direct_text("u-ghost"), 1_000)
            .await;

        // No realtime delivery anywhere, but the message is still persisted
        assert!(emitter.is_empty());
        assert_eq!(store.records().len(), 1);
    }

    #[tokio::test]
    async fn test_rate_limited_message_is_dropped() {
        let (registry, store, relay) = setup();
        let emitter = RecordingEmitter::new();
        registry.connect(&alice(), "conn-a");
        registry.connect(&Identity::new("u-bob", "bob"), "conn-b");

        relay
            .handle_message(&emitter, &alice(), "conn-a", direct_text("u-bob"), 1_000)
            .await;
        relay
            .handle_message(&emitter, &alice(), "conn-a", direct_text("u-bob"), 1_500)
            .await;

        let to_sender = emitter.to_connection("conn-a");
        assert_eq!(to_sender.len(), 1);
        assert!(
            matches!(&to_sender[0], ServerEvent::Error(n) if n.message == RATE_LIMIT_NOTICE)
        );

        // Second message neither relayed nor persisted
        assert_eq!(emitter.to_connection("conn-b").len(), 2);
        assert_eq!(store.records().len(), 1);

        // Accepted again once the window elapses
        relay
            .handle_message(&emitter, &alice(), "conn-a", direct_text("u-bob"), 1_000 + WINDOW)
            .await;
        assert_eq!(store.records().len(), 2);
    }

    #[tokio::test]
    async fn test_media_message_is_not_persisted() {
        let (registry, store, relay) = setup();
        let emitter = RecordingEmitter::new();
        registry.connect(&alice(), "conn-a");
        registry.connect(&Identity::new("u-bob", "bob"), "conn-b");

        let mut msg = direct_text("u-bob");
        msg.kind = "image".into();
        msg.media = Some(serde_json::json!({ "url": "https://cdn/img.png" }));

        relay
            .handle_message(&emitter, &alice(), "conn-a", msg, 1_000)
            .await;

        assert_eq!(emitter.to_connection("conn-b").len(), 2);
        assert!(store.records().is_empty());
    }

    #[tokio::test]
    async fn test_persistence_failure_notifies_sender_without_retraction() {
        let registry = Arc::new(Registry::new());
        let store = Arc::new(RecordingStore::failing());
        let relay = MessageRelay::new(registry.clone(), store, WINDOW);
        let emitter = RecordingEmitter::new();
        registry.connect(&alice(), "conn-a");
        registry.connect(&Identity::new("u-bob", "bob"), "conn-b");

        relay
            .handle_message(&emitter, &alice(), "conn-a", direct_text("u-bob"), 1_000)
            .await;

        // Realtime delivery already happened
        assert_eq!(emitter.to_connection("conn-b").len(), 2);

        let to_sender = emitter.to_connection("conn-a");
        assert_eq!(to_sender.len(), 1);
        assert!(
            matches!(&to_sender[0], ServerEvent::Error(n) if n.message == PERSIST_FAILURE_NOTICE)
        );
    }

    #[tokio::test]
    async fn test_malformed_message_is_rejected() {
        let (registry, store, relay) = setup();
        let emitter = RecordingEmitter::new();
        registry.connect(&alice(), "conn-a");

        // Direct message without a receiver
        let mut msg = direct_text("u-bob");
        msg.receiver = None;

        relay
            .handle_message(&emitter, &alice(), "conn-a", msg, 1_000)
            .await;

        let to_sender = emitter.to_connection("conn-a");
        assert!(
            matches!(&to_sender[0], ServerEvent::Error(n) if n.message == MALFORMED_NOTICE)
        );
        assert!(store.records().is_empty());
    }

    #[test]
    fn test_typing_routes_to_peer_or_room() {
        let (registry, _store, relay) = setup();
        let emitter = RecordingEmitter::new();
        registry.connect(&alice(), "conn-a");
        registry.connect(&Identity::new("u-bob", "bob"), "conn-b");
        registry.join_room("u-alice", "g-1");

        let direct = TypingNotice {
            receiver_id: Some("u-bob".into()),
            is_group: false,
            group_id: None,
        };
        relay.handle_typing(&emitter, &alice(), "conn-a", &direct, false);
        assert_eq!(
            emitter.to_connection("conn-b"),
            vec![ServerEvent::Typing("alice".into())]
        );

        let group = TypingNotice {
            receiver_id: None,
            is_group: true,
            group_id: Some("g-1".into()),
        };
        relay.handle_typing(&emitter, &alice(), "conn-a", &group, true);
        assert_eq!(
            emitter.to_room("g-1"),
            vec![ServerEvent::StopTyping("alice".into())]
        );
    }
}
