use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Who a user is on the marketplace. Roles gate who may *start* a
/// conversation with whom; they never restrict reading existing threads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Grower,
    Customer,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Grower => "grower",
            Role::Customer => "customer",
        }
    }

    pub fn parse(s: &str) -> Option<Role> {
        match s {
            "admin" => Some(Role::Admin),
            "grower" => Some(Role::Grower),
            "customer" => Some(Role::Customer),
            _ => None,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The directory view of a user — what the messaging engine is allowed to
/// know. Resolved at read time so display names always reflect the current
/// profile, never a snapshot stored alongside a message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub role: Role,
    pub display_name: String,
}

/// One point-to-point message. Immutable after the append except for the
/// one-way `read_at` transition, which is set at most once and never cleared.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub sender_id: Uuid,
    pub recipient_id: Uuid,
    pub content: String,
    pub sent_at: DateTime<Utc>,
    pub read_at: Option<DateTime<Utc>>,
}

impl Message {
    pub fn key(&self) -> ConversationKey {
        ConversationKey::new(self.sender_id, self.recipient_id)
    }

    pub fn is_unread_by(&self, viewer: Uuid) -> bool {
        self.recipient_id == viewer && self.read_at.is_none()
    }
}

/// Identity of a two-party conversation: the *unordered* pair of participant
/// ids, stored sorted so both directions map to the same key. An explicit
/// value type rather than a concatenated string, so a key can never be built
/// direction-dependently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConversationKey {
    first: Uuid,
    second: Uuid,
}

impl ConversationKey {
    pub fn new(a: Uuid, b: Uuid) -> Self {
        if a <= b {
            Self { first: a, second: b }
        } else {
            Self { first: b, second: a }
        }
    }

    /// The other participant, or None if `viewer` is not part of this key.
    pub fn counterparty_of(&self, viewer: Uuid) -> Option<Uuid> {
        if self.first == viewer {
            Some(self.second)
        } else if self.second == viewer {
            Some(self.first)
        } else {
            None
        }
    }
}

/// A per-viewer conversation summary. Derived from the message log on every
/// read; it has no lifecycle of its own and is never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct Conversation {
    pub counterparty: UserProfile,
    pub last_message: Message,
    pub unread_count: usize,
    pub last_message_from_viewer: bool,
}

/// The full chronological history between the viewer and one counterparty.
/// The counterparty profile is attached once, not repeated per message.
#[derive(Debug, Clone, Serialize)]
pub struct ConversationThread {
    pub counterparty: UserProfile,
    pub messages: Vec<Message>,
}
