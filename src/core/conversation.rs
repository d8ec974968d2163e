use crate::core::message::Message;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const DEFAULT_CHAT_TITLE: &str = "New Chat";
const TITLE_ELLIPSIS: &str = "...";

/// A titled, ordered exchange with one model.
///
/// While a reply streams, the last message is the assistant placeholder being
/// filled; everything before it is settled history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    pub id: String,
    pub title: String,
    pub messages: Vec<Message>,
    pub model: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Set when the title came from the user; derived titles never replace it.
    #[serde(default)]
    pub custom_title: bool,
}

impl Conversation {
    pub fn new(id: String, title: Option<String>, model: String, now: DateTime<Utc>) -> Self {
        let title = title
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());
        Self {
            id,
            custom_title: title.is_some(),
            title: title.unwrap_or_else(|| DEFAULT_CHAT_TITLE.to_string()),
            messages: Vec::new(),
            model,
            created_at: now,
            updated_at: now,
        }
    }

    /// Replace the message list and refresh the derived title, if any.
    pub fn replace_messages(
        &mut self,
        messages: Vec<Message>,
        title_max_len: usize,
        now: DateTime<Utc>,
    ) {
        self.messages = messages;
        self.updated_at = now;
        if !self.custom_title {
            if let Some(first) = self.messages.iter().find(|m| m.is_user()) {
                self.title = derive_title(&first.content, title_max_len);
            }
        }
    }

    pub fn rename(&mut self, title: &str, now: DateTime<Utc>) -> bool {
        let title = title.trim();
        if title.is_empty() {
            return false;
        }
        self.title = title.to_string();
        self.custom_title = true;
        self.updated_at = now;
        true
    }
}

/// Title from the first `max_len` characters of a message, always followed by
/// an ellipsis.
pub fn derive_title(content: &str, max_len: usize) -> String {
    let head: String = content.chars().take(max_len).collect();
    format!("{head}{TITLE_ELLIPSIS}")
}
