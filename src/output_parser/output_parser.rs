use super::OutputParseError;

/// What the model asked for, before it is checked against the finish tool name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedOutput {
    Action { tool: String, tool_input: String },
    Finish(String),
}

pub trait AgentOutputParser: Send + Sync {
    /// Extracts a tool invocation or a final answer from raw model text.
    ///
    /// A text matching neither shape is an [`OutputParseError`]; callers decide whether
    /// to retry with a fix-up or give up.
    fn parse(&self, text: &str) -> Result<ParsedOutput, OutputParseError>;
}
