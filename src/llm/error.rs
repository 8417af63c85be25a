use std::time::Duration;

use async_openai::error::OpenAIError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LLMError {
    #[error("OpenAI error: {0}")]
    OpenAIError(#[from] OpenAIError),

    #[error("Completion timed out after {0:?}")]
    Timeout(Duration),

    #[error("Content not found in response: {0}")]
    ContentNotFound(String),

    #[error("Error: {0}")]
    OtherError(String),
}
