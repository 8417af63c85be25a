use std::{fmt, sync::Arc};

use tokio::sync::RwLock;

use crate::schemas::Message;

use super::{Memory, MemoryError};

pub const DEFAULT_MAX_TOKEN_LIMIT: usize = 2000;

/// Counts the tokens of rendered history text.
pub type TokenCounter = Arc<dyn Fn(&str) -> usize + Send + Sync>;

/// History bounded by token count instead of message count.
///
/// After every insert the oldest messages are dropped until the rendered history fits
/// `max_token_limit`.
#[derive(Clone)]
pub struct TokenBufferMemory {
    max_token_limit: usize,
    human_prefix: String,
    ai_prefix: String,
    counter: TokenCounter,
    messages: Vec<Message>,
}

impl TokenBufferMemory {
    /// Counts tokens with the `cl100k_base` encoding used by the OpenAI chat models.
    pub fn new(max_token_limit: usize) -> Result<Self, MemoryError> {
        let bpe =
            tiktoken_rs::cl100k_base().map_err(|e| MemoryError::Tokenizer(e.to_string()))?;
        Ok(Self::with_counter(max_token_limit, move |text: &str| {
            bpe.encode_with_special_tokens(text).len()
        }))
    }

    pub fn with_counter<F>(max_token_limit: usize, counter: F) -> Self
    where
        F: Fn(&str) -> usize + Send + Sync + 'static,
    {
        Self {
            max_token_limit,
            human_prefix: "Human".into(),
            ai_prefix: "AI".into(),
            counter: Arc::new(counter),
            messages: Vec::new(),
        }
    }

    /// Speaker labels used when measuring the history.
    pub fn with_prefixes(mut self, human_prefix: &str, ai_prefix: &str) -> Self {
        self.human_prefix = human_prefix.into();
        self.ai_prefix = ai_prefix.into();
        self.prune();
        self
    }

    pub fn max_token_limit(&self) -> usize {
        self.max_token_limit
    }

    pub fn token_count(&self) -> usize {
        let text = Message::render_history(&self.messages, &self.human_prefix, &self.ai_prefix);
        (self.counter)(&text)
    }

    fn prune(&mut self) {
        let mut dropped = 0;
        while !self.messages.is_empty() && self.token_count() > self.max_token_limit {
            self.messages.remove(0);
            dropped += 1;
        }
        if dropped > 0 {
            log::debug!(
                "Pruned {dropped} messages to fit {} tokens",
                self.max_token_limit
            );
        }
    }
}

impl fmt::Debug for TokenBufferMemory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenBufferMemory")
            .field("max_token_limit", &self.max_token_limit)
            .field("human_prefix", &self.human_prefix)
            .field("ai_prefix", &self.ai_prefix)
            .field("messages", &self.messages)
            .finish()
    }
}

impl From<TokenBufferMemory> for Arc<RwLock<dyn Memory>> {
    fn from(val: TokenBufferMemory) -> Self {
        Arc::new(RwLock::new(val))
    }
}

impl Memory for TokenBufferMemory {
    fn messages(&self) -> Vec<Message> {
        self.messages.clone()
    }

    fn add_message(&mut self, message: Message) {
        self.messages.push(message);
        self.prune();
    }

    fn clear(&mut self) {
        self.messages.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word_count(text: &str) -> usize {
        text.split_whitespace().count()
    }

    #[test]
    fn test_prunes_oldest_first() {
        let mut memory = TokenBufferMemory::with_counter(9, word_count);
        memory.save_exchange("first question", "first answer");
        memory.save_exchange("second question", "second answer");

        let contents = memory
            .messages()
            .into_iter()
            .map(|m| m.content)
            .collect::<Vec<_>>();
        assert_eq!(contents, vec!["first answer", "second question", "second answer"]);
        assert!(memory.token_count() <= 9);
    }

    #[test]
    fn test_oversized_message_is_dropped() {
        let mut memory = TokenBufferMemory::with_counter(3, word_count);
        memory.add_human_message("this message is far too long");
        assert!(memory.messages().is_empty());
    }

    #[test]
    fn test_history_uses_prefixes() {
        let mut memory =
            TokenBufferMemory::with_counter(100, word_count).with_prefixes("User", "Diona");
        memory.save_exchange("hi", "hello");
        assert_eq!(memory.history("User", "Diona"), "User: hi\nDiona: hello");
    }

    #[test]
    fn test_tiktoken_counter() {
        let mut memory = TokenBufferMemory::new(DEFAULT_MAX_TOKEN_LIMIT).unwrap();
        memory.save_exchange("What is 2+2?", "4");

        let tokens = memory.token_count();
        assert!(tokens > 0 && tokens < 20);
        assert_eq!(memory.messages().len(), 2);
    }
}
