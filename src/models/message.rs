use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ParticipantType {
    User,
    Association,
}

impl ParticipantType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParticipantType::User => "user",
            ParticipantType::Association => "association",
        }
    }

    pub fn opposite(&self) -> Self {
        match self {
            ParticipantType::User => ParticipantType::Association,
            ParticipantType::Association => ParticipantType::User,
        }
    }
}

/// Display details the backend sometimes embeds next to an id.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ParticipantInfo {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    #[serde(default)]
    pub id: Option<i64>,
    pub sender_id: i64,
    pub sender_type: ParticipantType,
    pub receiver_id: i64,
    pub receiver_type: ParticipantType,
    pub message_content: String,
    pub sent_at: DateTime<Utc>,
    #[serde(default)]
    pub read_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender: Option<ParticipantInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receiver: Option<ParticipantInfo>,
}

impl Message {
    pub fn is_unread(&self) -> bool {
        self.read_at.is_none()
    }
}

/// The account whose inbox is being rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewer {
    pub id: i64,
    pub kind: ParticipantType,
}

impl Viewer {
    pub fn sent(&self, message: &Message) -> bool {
        message.sender_type == self.kind && message.sender_id == self.id
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SendMessageRequest<'a> {
    pub message_content: &'a str,
}
