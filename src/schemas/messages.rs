use std::fmt;

use serde::{Deserialize, Serialize};

use super::MessageType;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub message_type: MessageType,
    pub content: String,
}

impl Message {
    pub fn new(message_type: MessageType, content: impl Into<String>) -> Self {
        Self {
            message_type,
            content: content.into(),
        }
    }

    pub fn new_human_message(content: impl Into<String>) -> Self {
        Self::new(MessageType::Human, content)
    }

    pub fn new_ai_message(content: impl Into<String>) -> Self {
        Self::new(MessageType::Ai, content)
    }

    pub fn new_system_message(content: impl Into<String>) -> Self {
        Self::new(MessageType::System, content)
    }

    /// Renders a history as `Speaker: content` lines, with custom labels for the
    /// human and AI sides.
    pub fn render_history(messages: &[Message], human_prefix: &str, ai_prefix: &str) -> String {
        messages
            .iter()
            .map(|m| {
                let speaker = match m.message_type {
                    MessageType::Human => human_prefix,
                    MessageType::Ai => ai_prefix,
                    other => other.speaker(),
                };
                format!("{}: {}", speaker, m.content)
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.message_type.speaker(), self.content)
    }
}
