use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum OutputParseError {
    #[error("Could not parse LLM output: `{0}`")]
    NoMatch(String),
}
