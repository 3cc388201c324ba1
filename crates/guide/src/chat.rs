use serde::{Deserialize, Serialize};

use crate::prompt::chat_system_prompt;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

pub const DEFAULT_MAX_MESSAGES: usize = 20;

/// Chat transcript for one selected country.
///
/// Only user and assistant turns are stored; the country-scoped system prompt
/// is added by `to_request`. The oldest turns are dropped past
/// `max_messages`, and the kept window always starts with a user turn.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatHistory {
    country: String,
    messages: Vec<ChatMessage>,
    max_messages: usize,
}

impl ChatHistory {
    pub fn new(country: impl Into<String>, max_messages: usize) -> Self {
        Self {
            country: country.into(),
            messages: Vec::new(),
            max_messages: max_messages.max(1),
        }
    }

    /// Rebuilds a history from client-supplied turns. System messages are discarded.
    pub fn from_messages(
        country: impl Into<String>,
        messages: impl IntoIterator<Item = ChatMessage>,
        max_messages: usize,
    ) -> Self {
        let mut history = Self::new(country, max_messages);
        history.messages = messages
            .into_iter()
            .filter(|m| m.role != Role::System)
            .collect();
        history.trim();
        history
    }

    pub fn country(&self) -> &str {
        &self.country
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    pub fn push_user(&mut self, content: impl Into<String>) {
        self.messages.push(ChatMessage::user(content));
        self.trim();
    }

    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.messages.push(ChatMessage::assistant(content));
        self.trim();
    }

    /// Messages to send to the model: system prompt first, then the kept turns.
    pub fn to_request(&self) -> Vec<ChatMessage> {
        let mut out = Vec::with_capacity(self.messages.len() + 1);
        out.push(ChatMessage::system(chat_system_prompt(&self.country)));
        out.extend(self.messages.iter().cloned());
        out
    }

    fn trim(&mut self) {
        if self.messages.len() > self.max_messages {
            let excess = self.messages.len() - self.max_messages;
            self.messages.drain(..excess);
        }
        let leading = self
            .messages
            .iter()
            .take_while(|m| m.role != Role::User)
            .count();
        self.messages.drain(..leading);
    }
}
