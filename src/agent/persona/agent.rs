use crate::{
    agent::{behavior::conversational_fix, AgentBehavior, AgentType, PromptParts},
    output_parser::{AgentOutputParser, ReActOutputParser},
    schemas::TextReplacements,
    template::SCRATCHPAD_VARIABLE,
    tools::ToolRegistry,
};

use super::prompt::{FORMAT_INSTRUCTIONS, PREFIX, SUFFIX};

pub const DEFAULT_PERSONA: &str = "Diona";

/// Chat agent that stays in character as a named persona.
///
/// Replies are written as `{persona}: ...`, and nothing is inserted between an
/// observation and the next model turn.
#[derive(Debug, Clone)]
pub struct PersonaAgent {
    persona: String,
    parser: ReActOutputParser,
}

impl PersonaAgent {
    pub fn new(persona: impl Into<String>) -> Self {
        let persona = persona.into();
        Self {
            parser: ReActOutputParser::new(format!("{persona}:"), false),
            persona,
        }
    }

    pub fn persona(&self) -> &str {
        &self.persona
    }
}

impl Default for PersonaAgent {
    fn default() -> Self {
        Self::new(DEFAULT_PERSONA)
    }
}

impl AgentBehavior for PersonaAgent {
    fn agent_type(&self) -> AgentType {
        AgentType::Persona
    }

    fn llm_prefix(&self) -> &str {
        ""
    }

    fn ai_prefix(&self) -> &str {
        &self.persona
    }

    fn finish_tool_name(&self) -> &str {
        &self.persona
    }

    fn finish_marker(&self) -> &str {
        self.parser.finish_marker()
    }

    fn output_parser(&self) -> &dyn AgentOutputParser {
        &self.parser
    }

    fn fix_text(&self, text: &str) -> Option<String> {
        Some(conversational_fix(text, &self.persona))
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
            ("ai_prefix".to_string(), self.persona.clone()),
        ])
    }
}
