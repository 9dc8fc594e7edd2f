//! Inbound and outbound event catalogs.
//!
//! Events travel as JSON text frames of the form
//! `{"event": <name>, "data": <payload>}`. The names are part of the wire
//! contract and are reproduced exactly; `newMessage` is accepted as an
//! inbound alias for `new:message` for compatibility with older clients.

use serde::{Deserialize, Serialize};

use crate::payloads::{
    CallAcceptNotice, CallAnswer, CallAnswerNotice, CallOffer, CallOfferNotice, CallRequest,
    CallRequestNotice, CallTarget, CandidateNotice, DeclineNotice, ErrorNotice, FriendNotice,
    FriendTarget, GroupAlert, IceCandidate, NewMessage, RealtimeMessage, TypingNotice,
};

/// An event received from a connected client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ClientEvent {
    /// Subscribe the connection to a room.
    #[serde(rename = "joinRoom")]
    JoinRoom(String),

    /// Unsubscribe the connection from a room.
    #[serde(rename = "leaveRoom")]
    LeaveRoom(String),

    /// Send a chat message (direct or group).
    #[serde(rename = "new:message", alias = "newMessage")]
    NewMessage(NewMessage),

    /// The user started typing.
    #[serde(rename = "user:typing")]
    Typing(TypingNotice),

    /// The user stopped typing.
    #[serde(rename = "user:stopTyping")]
    StopTyping(TypingNotice),

    /// Send a friend request to another user.
    #[serde(rename = "friend:request")]
    FriendRequest(FriendTarget),

    /// Accept a friend request.
    #[serde(rename = "friend:accept")]
    FriendAccept(FriendTarget),

    /// Ask both parties to refresh their chat list.
    #[serde(rename = "refresh:chat")]
    RefreshChat(FriendTarget),

    /// Notify group members of a lifecycle change.
    #[serde(rename = "group:alert")]
    GroupAlert(GroupAlert),

    /// Ring another user.
    #[serde(rename = "call:request")]
    CallRequest(CallRequest),

    /// Accept an incoming ring.
    #[serde(rename = "call:request:accept")]
    CallRequestAccept(CallTarget),

    /// Decline an incoming ring.
    #[serde(rename = "decline:call")]
    DeclineCall(CallTarget),

    /// Forward an SDP offer to the peer.
    #[serde(rename = "call:user")]
    CallOffer(CallOffer),

    /// Forward an SDP answer to the peer.
    #[serde(rename = "call:accepted")]
    CallAnswer(CallAnswer),

    /// Forward an ICE candidate to the peer.
    #[serde(rename = "ice:candidate")]
    IceCandidate(IceCandidate),
}

impl ClientEvent {
    /// Wire name of this event, used for logging and metrics labels.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            ClientEvent::JoinRoom(_) => "joinRoom",
            ClientEvent::LeaveRoom(_) => "leaveRoom",
            ClientEvent::NewMessage(_) => "new:message",
            ClientEvent::Typing(_) => "user:typing",
            ClientEvent::StopTyping(_) => "user:stopTyping",
            ClientEvent::FriendRequest(_) => "friend:request",
            ClientEvent::FriendAccept(_) => "friend:accept",
            ClientEvent::RefreshChat(_) => "refresh:chat",
            ClientEvent::GroupAlert(_) => "group:alert",
            ClientEvent::CallRequest(_) => "call:request",
            ClientEvent::CallRequestAccept(_) => "call:request:accept",
            ClientEvent::DeclineCall(_) => "decline:call",
            ClientEvent::CallOffer(_) => "call:user",
            ClientEvent::CallAnswer(_) => "call:accepted",
            ClientEvent::IceCandidate(_) => "ice:candidate",
        }
    }
}

/// An event emitted to a connected client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ServerEvent {
    /// Full realtime message, delivered to the direct receiver or the
    /// group room.
    #[serde(rename = "new:message")]
    NewMessage(RealtimeMessage),

    /// Out-of-room message notification, delivered per member.
    #[serde(rename = "new:messageAlert")]
    NewMessageAlert(RealtimeMessage),

    /// A peer started typing; payload is their display name.
    #[serde(rename = "user:typing")]
    Typing(String),

    /// A peer stopped typing; payload is their display name.
    #[serde(rename = "user:stopTyping")]
    StopTyping(String),

    /// Incoming friend request.
    #[serde(rename = "friend:request")]
    FriendRequest(FriendNotice),

    /// A friend request was accepted.
    #[serde(rename = "friend:accept")]
    FriendAccept(FriendNotice),

    /// The chat list should be refetched.
    #[serde(rename = "refresh:chat")]
    RefreshChat,

    /// Templated group lifecycle notice.
    #[serde(rename = "group:alert")]
    GroupAlert(String),

    /// Incoming ring.
    #[serde(rename = "call:request")]
    CallRequest(CallRequestNotice),

    /// The ring was accepted.
    #[serde(rename = "call:request:accept")]
    CallRequestAccept(CallAcceptNotice),

    /// The ring was declined.
    #[serde(rename = "decline:call")]
    DeclineCall(DeclineNotice),

    /// SDP offer from the peer.
    #[serde(rename = "call:user")]
    CallOffer(CallOfferNotice),

    /// SDP answer from the peer.
    #[serde(rename = "call:accepted")]
    CallAnswer(CallAnswerNotice),

    /// ICE candidate from the peer.
    #[serde(rename = "ice:candidate")]
    IceCandidate(CandidateNotice),

    /// User-visible error notice.
    #[serde(rename = "error")]
    Error(ErrorNotice),
}

impl ServerEvent {
    /// Wire name of this event, used for logging and metrics labels.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            ServerEvent::NewMessage(_) => "new:message",
            ServerEvent::NewMessageAlert(_) => "new:messageAlert",
            ServerEvent::Typing(_) => "user:typing",
            ServerEvent::StopTyping(_) => "user:stopTyping",
            ServerEvent::FriendRequest(_) => "friend:request",
            ServerEvent::FriendAccept(_) => "friend:accept",
            ServerEvent::RefreshChat => "refresh:chat",
            ServerEvent::GroupAlert(_) => "group:alert",
            ServerEvent::CallRequest(_) => "call:request",
            ServerEvent::CallRequestAccept(_) => "call:request:accept",
            ServerEvent::DeclineCall(_) => "decline:call",
            ServerEvent::CallOffer(_) => "call:user",
            ServerEvent::CallAnswer(_) => "call:accepted",
            ServerEvent::IceCandidate(_) => "ice:candidate",
            ServerEvent::Error(_) => "error",
        }
    }

    /// Create an error notice event.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        ServerEvent::Error(ErrorNotice::new(message))
    }
}
