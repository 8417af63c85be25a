use std::{
    collections::VecDeque,
    sync::{Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use async_trait::async_trait;
use futures::stream;

use crate::llm::{options::CallOptions, LLMError, LLMStream, LLM};

/// A prompt and the stop words it was sent with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub prompt: String,
    pub stop_words: Vec<String>,
}

/// Completion service that replays scripted responses in order and records every call.
#[derive(Debug, Default)]
pub struct FakeLLM {
    responses: Mutex<VecDeque<String>>,
    calls: Mutex<Vec<RecordedCall>>,
    delay: Option<Duration>,
}

impl FakeLLM {
    pub fn new<S: Into<String>>(responses: impl IntoIterator<Item = S>) -> Self {
        Self {
            responses: Mutex::new(responses.into_iter().map(Into::into).collect()),
            calls: Mutex::new(Vec::new()),
            delay: None,
        }
    }

    /// Waits this long before answering each call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn call_count(&self) -> usize {
        lock(&self.calls).len()
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        lock(&self.calls).clone()
    }

    pub fn last_prompt(&self) -> Option<String> {
        lock(&self.calls).last().map(|call| call.prompt.clone())
    }

    async fn next_response(&self, prompt: &str, options: &CallOptions) -> Result<String, LLMError> {
        lock(&self.calls).push(RecordedCall {
            prompt: prompt.to_string(),
            stop_words: options.stop_words.clone().unwrap_or_default(),
        });

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        lock(&self.responses)
            .pop_front()
            .ok_or_else(|| LLMError::OtherError("FakeLLM has no responses left".into()))
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[async_trait]
impl LLM for FakeLLM {
    async fn generate(&self, prompt: &str, options: &CallOptions) -> Result<String, LLMError> {
        self.next_response(prompt, options).await
    }

    /// Yields the scripted response word by word, keeping the separators.
    async fn stream(&self, prompt: &str, options: &CallOptions) -> Result<LLMStream, LLMError> {
        let text = self.next_response(prompt, options).await?;
        let chunks = text
            .split_inclusive(' ')
            .map(|chunk| Ok(chunk.to_string()))
            .collect::<Vec<_>>();
        Ok(Box::pin(stream::iter(chunks)))
    }
}
