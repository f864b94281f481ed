//! Append-only conversation log

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Who produced a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Origin {
    User,
    Assistant,
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Origin::User => write!(f, "user"),
            Origin::Assistant => write!(f, "assistant"),
        }
    }
}

/// One exchanged message. Never mutated after it is appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub text: String,
    pub origin: Origin,
    pub created_at: DateTime<Utc>,
}

impl Message {
    pub fn new(origin: Origin, text: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            text: text.into(),
            origin,
            created_at: Utc::now(),
        }
    }
}

/// Ordered record of the session's messages
#[derive(Debug, Default, Clone)]
pub struct ConversationLog {
    messages: Vec<Message>,
}

impl ConversationLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message and return a reference to it
    pub fn append(&mut self, origin: Origin, text: impl Into<String>) -> &Message {
        self.messages.push(Message::new(origin, text));
        &self.messages[self.messages.len() - 1]
    }

    /// Messages in insertion order
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Messages appended at or after `index`, for incremental rendering
    pub fn since(&self, index: usize) -> &[Message] {
        self.messages.get(index..).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
