use std::fmt::Debug;

use crate::{
    output_parser::{AgentOutputParser, OutputParseError, ParsedOutput},
    schemas::{AgentStep, TextReplacements},
    template::{PromptTemplate, TemplateError},
    tools::ToolRegistry,
};

use super::{AgentError, AgentType};

pub const DEFAULT_OBSERVATION_PREFIX: &str = "Observation: ";
pub const DEFAULT_LLM_PREFIX: &str = "Thought:";

/// The pieces a prompt is assembled from. `prefix` and `format_instructions` may use
/// the `{tool_names}` and `{ai_prefix}` placeholders, which are filled in by the agent
/// when the prompt is built. Run-time variables such as `{input}` belong in `suffix`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptParts {
    pub prefix: String,
    pub format_instructions: String,
    pub suffix: String,
    pub input_variables: Vec<String>,
}

impl PromptParts {
    pub fn new<S: Into<String>>(
        prefix: impl Into<String>,
        format_instructions: impl Into<String>,
        suffix: impl Into<String>,
        input_variables: impl IntoIterator<Item = S>,
    ) -> Self {
        Self {
            prefix: prefix.into(),
            format_instructions: format_instructions.into(),
            suffix: suffix.into(),
            input_variables: input_variables.into_iter().map(Into::into).collect(),
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn with_format_instructions(mut self, format_instructions: impl Into<String>) -> Self {
        self.format_instructions = format_instructions.into();
        self
    }

    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = suffix.into();
        self
    }

    pub fn with_input_variables<S: Into<String>>(
        mut self,
        input_variables: impl IntoIterator<Item = S>,
    ) -> Self {
        self.input_variables = input_variables.into_iter().map(Into::into).collect();
        self
    }
}

/// What distinguishes one kind of agent from another: its prompt, its text protocol
/// details and how it recovers from unparsable output.
///
/// The planner and executor only talk to agents through this trait, so a new kind is
/// added by implementing it; [`AgentType`] selects among the built-in ones.
pub trait AgentBehavior: Send + Sync + Debug {
    fn agent_type(&self) -> AgentType;

    /// Text placed before every observation in the scratchpad.
    fn observation_prefix(&self) -> &str {
        DEFAULT_OBSERVATION_PREFIX
    }

    /// Text placed after every observation, cueing the model's next thought.
    fn llm_prefix(&self) -> &str {
        DEFAULT_LLM_PREFIX
    }

    /// Speaker labels used when rendering chat history into the prompt.
    fn human_prefix(&self) -> &str {
        "Human"
    }

    fn ai_prefix(&self) -> &str {
        "AI"
    }

    /// An action naming this tool is treated as a final answer.
    fn finish_tool_name(&self) -> &str;

    fn finish_marker(&self) -> &str;

    fn output_parser(&self) -> &dyn AgentOutputParser;

    fn extract_action(&self, text: &str) -> Result<ParsedOutput, OutputParseError> {
        self.output_parser().parse(text)
    }

    /// Nudge appended to unparsable output before the model is asked to continue.
    /// `None` means a parse failure is fatal.
    fn fix_text(&self, _text: &str) -> Option<String> {
        None
    }

    fn default_prompt_parts(&self) -> PromptParts;

    /// Values substituted into the prompt prefix and format instructions.
    fn prompt_values(&self, tools: &ToolRegistry) -> TextReplacements {
        TextReplacements::from([("tool_names".to_string(), tools.names().join(", "))])
    }

    /// Joins prefix, tool descriptions, format instructions and suffix with blank lines.
    ///
    /// Everything but the suffix is escaped after filling, so braces in tool
    /// descriptions reach the model verbatim.
    fn create_prompt(
        &self,
        tools: &ToolRegistry,
        parts: &PromptParts,
    ) -> Result<PromptTemplate, TemplateError> {
        let values = self.prompt_values(tools);
        let fill = |text: &str| {
            PromptTemplate::new(text, Vec::<String>::new())
                .format(&values)
                .map(|filled| PromptTemplate::escape(&filled))
        };

        let template = [
            fill(&parts.prefix)?,
            PromptTemplate::escape(&tools.descriptions()),
            fill(&parts.format_instructions)?,
            parts.suffix.clone(),
        ]
        .join("\n\n");

        Ok(PromptTemplate::new(template, parts.input_variables.clone()).ensure_scratchpad())
    }

    fn validate_tools(&self, _tools: &ToolRegistry) -> Result<(), AgentError> {
        Ok(())
    }

    /// Sequences that end generation where the model would start inventing an
    /// observation.
    fn stop_words(&self) -> Vec<String> {
        let prefix = self.observation_prefix().trim_end();
        vec![format!("\n{prefix}"), format!("\n\t{prefix}")]
    }

    /// Serialized record of prior steps, rebuilt from scratch on every call.
    fn construct_scratchpad(&self, steps: &[AgentStep]) -> String {
        let mut thoughts = String::new();
        for step in steps {
            thoughts.push_str(&step.action.log);
            thoughts.push('\n');
            thoughts.push_str(self.observation_prefix());
            thoughts.push_str(&step.observation);
            thoughts.push('\n');
            thoughts.push_str(self.llm_prefix());
        }
        thoughts
    }
}

/// Fix-up shared by the conversational kinds: a dangling `Action:` gets its input line,
/// anything else is steered towards a direct reply.
pub(super) fn conversational_fix(text: &str, ai_prefix: &str) -> String {
    if text.contains("Action:") {
        format!("{text}\nAction Input:")
    } else {
        format!("{text}\n{ai_prefix}:")
    }
}
