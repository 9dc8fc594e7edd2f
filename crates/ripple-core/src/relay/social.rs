//! Social-graph and group-lifecycle signal relay.
//!
//! Stateless routing via the presence registry: friend requests and accepts
//! are point-to-point, `refresh:chat` goes to both parties, and group alerts
//! fan a templated notice out to each listed member. Absent recipients are
//! silent no-ops throughout.

use std::sync::Arc;

use ripple_protocol::{FriendNotice, FriendTarget, GroupAlert, GroupAlertKind, ServerEvent, UserRef};

use crate::emit::Emitter;
use crate::registry::{Identity, Registry};

/// Relay for `friend:*`, `refresh:chat`, and `group:alert` events.
pub struct SocialRelay {
    registry: Arc<Registry>,
}

impl SocialRelay {
    /// Create a new social relay.
    #[must_use]
    pub fn new(registry: Arc<Registry>) -> Self {
        Self { registry }
    }

    /// Relay a friend request to the receiver, if present.
    pub fn friend_request(&self, emitter: &dyn Emitter, sender: &Identity, target: &FriendTarget) {
        if let Some(conn) = self.registry.connection_of(&target.receiver_id) {
            emitter.emit(&conn, ServerEvent::FriendRequest(self.notice(sender)));
        }
    }

    /// Relay a friend accept to the receiver and ask both parties to
    /// refresh their chat list.
    pub fn friend_accept(&self, emitter: &dyn Emitter, sender: &Identity, target: &FriendTarget) {
        if let Some(conn) = self.registry.connection_of(&target.receiver_id) {
            emitter.emit(&conn, ServerEvent::FriendAccept(self.notice(sender)));
            emitter.emit(&conn, ServerEvent::RefreshChat);
        }
        if let Some(conn) = self.registry.connection_of(&sender.id) {
            emitter.emit(&conn, ServerEvent::RefreshChat);
        }
    }

    /// Ask both parties to refresh their chat list.
    pub fn refresh_chat(&self, emitter: &dyn Emitter, sender: &Identity, target: &FriendTarget) {
        if let Some(conn) = self.registry.connection_of(&target.receiver_id) {
            emitter.emit(&conn, ServerEvent::RefreshChat);
        }
        if let Some(conn) = self.registry.connection_of(&sender.id) {
            emitter.emit(&conn, ServerEvent::RefreshChat);
        }
    }

    /// Emit one templated notice per listed member; `deleteGroup`,
    /// `leaveGroup`, and `create` additionally trigger a `refresh:chat`
    /// per member.
    pub fn group_alert(&self, emitter: &dyn Emitter, sender: &Identity, alert: &GroupAlert) {
        for member in &alert.members {
            if member.id == sender.id {
                continue;
            }
            let Some(conn) = self.registry.connection_of(&member.id) else {
                continue;
            };

            let text = render_notice(alert.kind, &sender.display_name, &alert.group_name, member);
            emitter.emit(&conn, ServerEvent::GroupAlert(text));

            if alert.kind.triggers_refresh() {
                emitter.emit(&conn, ServerEvent::RefreshChat);
            }
        }
    }

    fn notice(&self, sender: &Identity) -> FriendNotice {
        FriendNotice {
            username: sender.display_name.clone(),
            id: sender.id.clone(),
        }
    }
}

/// Render the human-readable notice for a group alert subtype.
///
/// The wording (including its spacing) is part of the wire contract and is
/// reproduced verbatim.
fn render_notice(kind: GroupAlertKind, actor: &str, group: &str, member: &UserRef) -> String {
    match kind {
        GroupAlertKind::UpdateInfo => format!("{actor} updated {group} group info."),
        GroupAlertKind::AddNewMembers => format!(
            "{actor} added {group} group member. (New Member: {})",
            member.username
        ),
        GroupAlertKind::RemoveMember => {
            format!("{actor} removed {} from {group} group", member.username)
        }
        GroupAlertKind::DeleteGroup => format!("{actor} deleted {group} group."),
        // The doubled space is part of the contract text.
        GroupAlertKind::LeaveGroup => format!("{actor} left the  {group} group."),
        GroupAlertKind::ChangeRole => format!(
            "{actor} promoted {} to admin in {group} group",
            member.username
        ),
        GroupAlertKind::RemoveAdmin => format!(
            "{actor} removed admin privileges from {} in {group} group",
            member.username
        ),
        GroupAlertKind::Create => {
            format!("{actor} created {group} group and added you to the group.")
        }
    }
}
