use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ToolError {
    #[error("Error while running tool: {0}")]
    ExecutionError(Box<dyn std::error::Error + Send + Sync>),

    #[error("Invalid tool input: {0}")]
    InvalidInput(String),

    #[error("Tool timed out after {0:?}")]
    Timeout(Duration),

    #[error("Tool task failed: {0}")]
    TaskFailed(String),

    #[error("Duplicate tool name: {0}")]
    DuplicateName(String),

    #[error("Allowed tools ({allowed:?}) different than provided tools ({provided:?})")]
    NotAllowed {
        allowed: Vec<String>,
        provided: Vec<String>,
    },
}

impl ToolError {
    pub fn execution_error<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        ToolError::ExecutionError(Box::new(error))
    }
}

impl From<std::io::Error> for ToolError {
    fn from(error: std::io::Error) -> Self {
        ToolError::execution_error(error)
    }
}
