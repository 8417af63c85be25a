use std::sync::Arc;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use super::{AgentBehavior, ChatAgent, PersonaAgent, QaAgent};

/// Built-in agent kinds, named as they appear in configuration.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString, Serialize, Deserialize,
)]
pub enum AgentType {
    #[default]
    #[strum(serialize = "qa-bot")]
    #[serde(rename = "qa-bot")]
    Qa,

    #[strum(serialize = "chat-bot")]
    #[serde(rename = "chat-bot")]
    Chat,

    #[strum(serialize = "persona-bot")]
    #[serde(rename = "persona-bot")]
    Persona,
}

impl AgentType {
    /// Builds the behavior for this kind. `ai_prefix` names the speaker for the chat
    /// and persona kinds and is ignored by the question answering kind.
    pub fn behavior(self, ai_prefix: Option<&str>) -> Arc<dyn AgentBehavior> {
        match (self, ai_prefix) {
            (AgentType::Qa, _) => Arc::new(QaAgent::new()),
            (AgentType::Chat, Some(prefix)) => Arc::new(ChatAgent::new(prefix)),
            (AgentType::Chat, None) => Arc::new(ChatAgent::default()),
            (AgentType::Persona, Some(prefix)) => Arc::new(PersonaAgent::new(prefix)),
            (AgentType::Persona, None) => Arc::new(PersonaAgent::default()),
        }
    }
}
