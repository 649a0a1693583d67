use serde::{Deserialize, Serialize};
use chrono::NaiveDateTime;

/// Message author, as the service spells it on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
    // Present on messages fetched from the service; the service emits naive UTC.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<NaiveDateTime>,
}

impl ChatMessage {
    pub fn user(content: &str) -> Self {
        Self {
            role: Role::User,
            content: content.to_string(),
            timestamp: None,
        }
    }

    pub fn assistant(content: &str) -> Self {
        Self {
            role: Role::Assistant,
            content: content.to_string(),
            timestamp: None,
        }
    }

    pub fn system(content: &str) -> Self {
        Self {
            role: Role::System,
            content: content.to_string(),
            timestamp: None,
        }
    }
}

/// Body of `POST /api/chat`. A fresh conversation sends `conversation_id: null`
/// and adopts the id the service assigns in the reply.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    pub conversation_id: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatReply {
    pub conversation_id: i64,
    pub reply: String,
}
