//! Payload shapes for the Ripple event catalog.
//!
//! Field names follow the JSON wire contract (`_id`, `isGroup`, `createdAt`,
//! ...), so most structs carry explicit serde renames. Inbound payloads are
//! lenient about optional fields; semantic validation happens in the relay.

use serde::{Deserialize, Serialize};

/// Message kind that is persisted by the durable store.
///
/// Other kinds (media references, etc.) are relayed but never persisted.
pub const TEXT_MESSAGE_KIND: &str = "text";

/// A user reference as it appears on the wire: `{"_id": ..., "username": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRef {
    /// User identifier.
    #[serde(rename = "_id")]
    pub id: String,
    /// Display name. Not all producers include it.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub username: String,
}

impl UserRef {
    /// Create a user reference without a display name.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            username: String::new(),
        }
    }

    /// Create a user reference with a display name.
    #[must_use]
    pub fn named(id: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            username: username.into(),
        }
    }
}

/// The sender block embedded in realtime message payloads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SenderRef {
    /// Sender display name.
    pub username: String,
    /// Sender identifier.
    #[serde(rename = "_id")]
    pub id: String,
}

/// Inbound `new:message` payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMessage {
    /// Client-assigned message id, echoed back in realtime payloads.
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub client_message_id: Option<String>,
    /// Message body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Direct-message receiver. Required when `is_group` is false.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receiver: Option<UserRef>,
    /// Whether this is a group message.
    #[serde(default)]
    pub is_group: bool,
    /// Group id. Required when `is_group` is true.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    /// Message kind (`"text"`, media kinds, ...).
    #[serde(rename = "type")]
    pub kind: String,
    /// Opaque media reference, relayed untouched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media: Option<serde_json::Value>,
    /// Group member user ids for out-of-room alerts.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub members: Vec<String>,
}

/// Outbound realtime message payload.
///
/// Exists only for the duration of the emit; the persisted record is a
/// separate, flatter shape owned by the store boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RealtimeMessage {
    /// Client-assigned message id.
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub client_message_id: Option<String>,
    /// Sender identity.
    pub sender: SenderRef,
    /// Direct-message receiver, absent on group messages.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receiver: Option<UserRef>,
    /// Group id, absent on direct messages.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    /// Message body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Opaque media reference.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media: Option<serde_json::Value>,
    /// Message kind.
    #[serde(rename = "type")]
    pub kind: String,
    /// Whether this is a group message.
    pub is_group: bool,
    /// Server-side creation timestamp, milliseconds since the Unix epoch.
    pub created_at: u64,
}

/// Inbound typing indicator payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypingNotice {
    /// Direct peer, when not a group indicator.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receiver_id: Option<String>,
    /// Whether the indicator targets the sender's current room.
    #[serde(default)]
    pub is_group: bool,
    /// Group id, informational only; routing uses the tracked room.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,
}

/// Inbound payload naming a single peer (`friend:request`, `friend:accept`,
/// `refresh:chat`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FriendTarget {
    /// The other party.
    pub receiver_id: String,
}

/// Outbound social notice carrying the acting user's identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FriendNotice {
    /// Acting user's display name.
    pub username: String,
    /// Acting user's id.
    #[serde(rename = "_id")]
    pub id: String,
}

/// Group lifecycle alert subtypes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GroupAlertKind {
    #[serde(rename = "updateInfo")]
    UpdateInfo,
    #[serde(rename = "addNewMembers")]
    AddNewMembers,
    #[serde(rename = "removeMember")]
    RemoveMember,
    #[serde(rename = "deleteGroup")]
    DeleteGroup,
    #[serde(rename = "leaveGroup")]
    LeaveGroup,
    #[serde(rename = "changeRole")]
    ChangeRole,
    #[serde(rename = "removeAdmin")]
    RemoveAdmin,
    #[serde(rename = "create")]
    Create,
}

impl GroupAlertKind {
    /// Whether this subtype additionally triggers a `refresh:chat` notice
    /// per member.
    #[must_use]
    pub fn triggers_refresh(self) -> bool {
        matches!(
            self,
            GroupAlertKind::DeleteGroup | GroupAlertKind::LeaveGroup | GroupAlertKind::Create
        )
    }
}

/// Inbound `group:alert` payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupAlert {
    /// Members to notify.
    pub members: Vec<UserRef>,
    /// Group display name, used in the templated notice.
    pub group_name: String,
    /// Alert subtype.
    #[serde(rename = "type")]
    pub kind: GroupAlertKind,
}

/// Inbound `call:request` payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallRequest {
    /// Target user id.
    pub id: String,
    /// Call type (audio/video), relayed untouched.
    #[serde(rename = "type")]
    pub call_type: String,
}

/// Inbound call payload naming only a target user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallTarget {
    /// Target user id.
    pub id: String,
}

/// Inbound `call:user` payload carrying an SDP offer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallOffer {
    /// Target user id.
    pub id: String,
    /// Opaque SDP offer, relayed untouched.
    pub offer: serde_json::Value,
}

/// Inbound `call:accepted` payload carrying an SDP answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallAnswer {
    /// Target user id.
    pub id: String,
    /// Opaque SDP answer, relayed untouched.
    pub answer: serde_json::Value,
}

/// Inbound `ice:candidate` payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IceCandidate {
    /// Target user id.
    pub id: String,
    /// Opaque ICE candidate, relayed untouched.
    pub candidate: serde_json::Value,
}

/// Outbound `call:request` notice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallRequestNotice {
    /// Caller user id.
    pub id: String,
    /// Caller display name.
    pub username: String,
    /// Call type.
    #[serde(rename = "type")]
    pub call_type: String,
}

/// Outbound `call:request:accept` notice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallAcceptNotice {
    /// Accepter user id.
    pub id: String,
    /// Accepter display name.
    pub username: String,
}

/// Outbound `decline:call` notice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeclineNotice {
    /// Decliner display name.
    pub username: String,
}

/// Outbound `call:user` notice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallOfferNotice {
    /// Opaque SDP offer.
    pub offer: serde_json::Value,
    /// Caller user id.
    pub id: String,
}

/// Outbound `call:accepted` notice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallAnswerNotice {
    /// Opaque SDP answer.
    pub answer: serde_json::Value,
}

/// Outbound `ice:candidate` notice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateNotice {
    /// Opaque ICE candidate.
    pub candidate: serde_json::Value,
}

/// Outbound user-visible error notice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorNotice {
    /// Human-readable message.
    pub message: String,
}

impl ErrorNotice {
    /// Create a new error notice.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_new_message_wire_names() {
        let raw = json!({
            "_id": "m-1",
            "message": "hi",
            "receiver": { "_id": "u-2", "username": "bob" },
            "isGroup": false,
            "type": "text"
        });

        let msg: NewMessage = serde_json::from_value(raw).unwrap();
        assert_eq!(msg.client_message_id.as_deref(), Some("m-1"));
        assert_eq!(msg.receiver.as_ref().unwrap().id, "u-2");
        assert!(!msg.is_group);
        assert_eq!(msg.kind, "text");
        assert!(msg.members.is_empty());
    }

    #[test]
    fn test_group_message_members_are_plain_ids() {
        let raw = json!({
            "message": "hello all",
            "isGroup": true,
            "group": "g-1",
            "type": "text",
            "members": ["u-1", "u-2", "u-3"]
        });

        let msg: NewMessage = serde_json::from_value(raw).unwrap();
        assert!(msg.is_group);
        assert_eq!(msg.members, vec!["u-1", "u-2", "u-3"]);
    }

    #[test]
    fn test_realtime_message_serializes_camel_case() {
        let payload = RealtimeMessage {
            client_message_id: Some("m-9".into()),
            sender: SenderRef {
                username: "alice".into(),
                id: "u-1".into(),
            },
            receiver: Some(UserRef::new("u-2")),
            group: None,
            message: Some("hey".into()),
            media: None,
            kind: "text".into(),
            is_group: false,
            created_at: 1234,
        };

        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value["_id"], "m-9");
        assert_eq!(value["sender"]["_id"], "u-1");
        assert_eq!(value["isGroup"], false);
        assert_eq!(value["createdAt"], 1234);
        assert_eq!(value["type"], "text");
        assert!(value.get("group").is_none());
    }

    #[test]
    fn test_group_alert_kind_wire_names() {
        let alert: GroupAlert = serde_json::from_value(json!({
            "members": [{ "_id": "u-2", "username": "bob" }],
            "groupName": "rustaceans",
            "type": "deleteGroup"
        }))
        .unwrap();

        assert_eq!(alert.kind, GroupAlertKind::DeleteGroup);
        assert!(alert.kind.triggers_refresh());
        assert!(!GroupAlertKind::ChangeRole.triggers_refresh());
    }
}
