use serde::{Deserialize, Serialize};

use super::message::Message;

/// Per-counterpart aggregate derived from a message list. Never stored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConversationSummary {
    pub counterpart_id: i64,
    pub counterpart_name: String,
    pub counterpart_avatar: Option<String>,
    pub last_message: Message,
    pub unread_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Delivery {
    Confirmed,
    Pending { local_id: String },
    Failed { local_id: String, reason: String },
}

impl Delivery {
    pub fn as_str(&self) -> &'static str {
        match self {
            Delivery::Confirmed => "confirmed",
            Delivery::Pending { .. } => "pending",
            Delivery::Failed { .. } => "failed",
        }
    }

    pub fn local_id(&self) -> Option<&str> {
        match self {
            Delivery::Confirmed => None,
            Delivery::Pending { local_id } | Delivery::Failed { local_id, .. } => Some(local_id),
        }
    }
}

/// A message as displayed in an open thread.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ThreadMessage {
    pub message: Message,
    pub sender_name: String,
    pub delivery: Delivery,
}

impl ThreadMessage {
    pub fn is_from_user(&self) -> bool {
        self.message.sender_type == super::ParticipantType::User
    }
}
