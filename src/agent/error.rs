use thiserror::Error;

use crate::{
    config::ConfigError,
    llm::LLMError, output_parser::OutputParseError, template::TemplateError, tools::ToolError,
};

/// Errors that can occur during agent operations.
#[derive(Error, Debug)]
pub enum AgentError {
    /// An error that occurred during interaction with the LLM.
    #[error("LLM error: {0}")]
    LLMError(#[from] LLMError),

    /// An error that occurred while formatting the prompt, e.g. missing variables.
    #[error("Prompt error: {0}")]
    PromptError(#[from] TemplateError),

    /// A tool failed and the executor is configured to propagate tool failures.
    #[error("Tool error: {0}")]
    ToolError(#[from] ToolError),

    /// The tools handed to the executor do not satisfy the agent.
    #[error("Tool validation error: {0}")]
    ToolValidation(String),

    /// The LLM output could not be parsed and the agent has no way to recover.
    #[error("Parse error: {0}")]
    ParseError(#[from] OutputParseError),

    /// The LLM output was still unparsable after the allowed number of fix-ups.
    #[error("Could not parse LLM output after {0} fix attempts")]
    TooManyFixAttempts(usize),

    #[error("Unknown agent type: {0}")]
    UnknownAgentType(String),

    #[error("Config error: {0}")]
    ConfigError(#[from] ConfigError),

    /// The blocking runtime could not be created.
    #[error("Runtime error: {0}")]
    RuntimeError(#[from] std::io::Error),

    /// A catch-all variant for miscellaneous agent errors.
    #[error("Error: {0}")]
    OtherError(String),
}
