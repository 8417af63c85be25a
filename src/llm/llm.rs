use std::{pin::Pin, sync::Arc};

use async_trait::async_trait;
use futures::{stream, Stream};

use crate::llm::{options::CallOptions, LLMError};

pub type LLMStream = Pin<Box<dyn Stream<Item = Result<String, LLMError>> + Send>>;

/// A text completion service: prompt in, generated text out.
///
/// Generation should halt at any of `options.stop_words`.
#[async_trait]
pub trait LLM: Sync + Send {
    async fn generate(&self, prompt: &str, options: &CallOptions) -> Result<String, LLMError>;

    /// Streams the completion as text chunks.
    ///
    /// The default implementation yields the whole [`LLM::generate`] result as one chunk.
    async fn stream(&self, prompt: &str, options: &CallOptions) -> Result<LLMStream, LLMError> {
        let text = self.generate(prompt, options).await?;
        Ok(Box::pin(stream::once(async move { Ok(text) })))
    }
}

#[async_trait]
impl<L> LLM for Arc<L>
where
    L: LLM + ?Sized,
{
    async fn generate(&self, prompt: &str, options: &CallOptions) -> Result<String, LLMError> {
        (**self).generate(prompt, options).await
    }

    async fn stream(&self, prompt: &str, options: &CallOptions) -> Result<LLMStream, LLMError> {
        (**self).stream(prompt, options).await
    }
}

impl<L> From<L> for Box<dyn LLM>
where
    L: 'static + LLM,
{
    fn from(llm: L) -> Self {
        Box::new(llm)
    }
}
