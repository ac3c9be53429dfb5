use crate::{
    domain::UserId,
    messaging::types::{ChatKind, InboundMessage},
};

// ============== Authorization ==============

/// Allow-lists for senders, group chats and channels.
///
/// With every list empty the bot is open to anyone. Once any list is set, a
/// message must match at least one of them.
#[derive(Clone, Debug, Default)]
pub struct AccessPolicy {
    users: Vec<i64>,
    groups: Vec<i64>,
    channels: Vec<i64>,
}

impl AccessPolicy {
    pub fn new(users: Vec<i64>, groups: Vec<i64>, channels: Vec<i64>) -> Self {
        Self {
            users,
            groups,
            channels,
        }
    }

    pub fn is_open(&self) -> bool {
        self.users.is_empty() && self.groups.is_empty() && self.channels.is_empty()
    }

    pub fn allows(&self, msg: &InboundMessage) -> bool {
        if self.is_open() {
            return true;
        }
        if self.allows_user(msg.sender) {
            return true;
        }
        match msg.chat_kind {
            ChatKind::Group => self.groups.contains(&msg.chat_id.0),
            ChatKind::Channel => self.channels.contains(&msg.chat_id.0),
            ChatKind::Private => false,
        }
    }

    fn allows_user(&self, user: Option<UserId>) -> bool {
        user.is_some_and(|u| self.users.contains(&u.0))
    }
}
