use serde::{Deserialize, Serialize};
use chrono::NaiveDateTime;

use super::ChatMessage;

/// One entry in the saved-conversation list. Order is server-determined and
/// preserved as-is.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationSummary {
    pub id: i64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<NaiveDateTime>,
}

impl ConversationSummary {
    pub fn display_title(&self) -> &str {
        match self.title.as_deref() {
            Some(title) if !title.is_empty() => title,
            _ => "Untitled",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationInfo {
    pub id: i64,
    #[serde(default)]
    pub title: Option<String>,
}

/// Response of `GET /api/conversations/{id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct ConversationDetail {
    pub conversation: ConversationInfo,
    pub messages: Vec<ChatMessage>,
}
