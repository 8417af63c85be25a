use serde::{Deserialize, Serialize};
use std::fmt;

/// Author of a chat history entry.
#[derive(PartialEq, Eq, Serialize, Deserialize, Debug, Clone, Copy, Default)]
pub enum MessageType {
    #[serde(rename = "system")]
    #[default]
    System,
    #[serde(rename = "ai")]
    Ai,
    #[serde(rename = "human")]
    Human,
    #[serde(rename = "tool")]
    Tool,
}

impl MessageType {
    /// Speaker label used when history is rendered into a text prompt.
    pub fn speaker(&self) -> &'static str {
        match self {
            MessageType::System => "System",
            MessageType::Ai => "AI",
            MessageType::Human => "Human",
            MessageType::Tool => "Tool",
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageType::System => write!(f, "system"),
            MessageType::Ai => write!(f, "ai"),
            MessageType::Human => write!(f, "human"),
            MessageType::Tool => write!(f, "tool"),
        }
    }
}
