use crate::{
    agent::{behavior::conversational_fix, AgentBehavior, AgentType, PromptParts},
    output_parser::{AgentOutputParser, ReActOutputParser},
    schemas::TextReplacements,
    template::SCRATCHPAD_VARIABLE,
    tools::ToolRegistry,
};

use super::prompt::{FORMAT_INSTRUCTIONS, PREFIX, SUFFIX};

pub const DEFAULT_AI_PREFIX: &str = "AI";

/// Conversational agent that answers with `{ai_prefix}: ...` and sees the chat history.
#[derive(Debug, Clone)]
pub struct ChatAgent {
    ai_prefix: String,
    parser: ReActOutputParser,
}

impl ChatAgent {
    pub fn new(ai_prefix: impl Into<String>) -> Self {
        let ai_prefix = ai_prefix.into();
        Self {
            parser: ReActOutputParser::new(format!("{ai_prefix}:"), false),
            ai_prefix,
        }
    }
}

impl Default for ChatAgent {
    fn default() -> Self {
        Self::new(DEFAULT_AI_PREFIX)
    }
}

impl AgentBehavior for ChatAgent {
    fn agent_type(&self) -> AgentType {
        AgentType::Chat
    }

    fn ai_prefix(&self) -> &str {
        &self.ai_prefix
    }

    fn finish_tool_name(&self) -> &str {
        &self.ai_prefix
    }

    fn finish_marker(&self) -> &str {
        self.parser.finish_marker()
    }

    fn output_parser(&self) -> &dyn AgentOutputParser {
        &self.parser
    }

    fn fix_text(&self, text: &str) -> Option<String> {
        Some(conversational_fix(text, &self.ai_prefix))
    }

    fn default_prompt_parts(&self) -> PromptParts {
        PromptParts::new(
            PREFIX,
            FORMAT_INSTRUCTIONS,
            SUFFIX,
            ["input", "chat_history", SCRATCHPAD_VARIABLE],
        )
    }

    fn prompt_values(&self, tools: &ToolRegistry) -> TextReplacements {
        TextReplacements::from([
            ("tool_names".to_string(), tools.names().join(", ")),
            ("ai_prefix".to_string(), self.ai_prefix.clone()),
        ])
    }
}
