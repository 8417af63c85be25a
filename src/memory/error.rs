use thiserror::Error;

#[derive(Error, Debug)]
pub enum MemoryError {
    #[error("Failed to load tokenizer: {0}")]
    Tokenizer(String),
}
