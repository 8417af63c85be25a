pub use async_openai::config::{AzureConfig, Config, OpenAIConfig};

use async_openai::{
    types::{
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequest,
        CreateChatCompletionRequestArgs, Stop,
    },
    Client,
};
use async_trait::async_trait;
use futures::StreamExt;

use crate::llm::{options::CallOptions, LLMError, LLMStream, LLM};

use super::OpenAIModel;

/// Text completion over the OpenAI chat API: the whole prompt is sent as one user message.
#[derive(Clone)]
pub struct OpenAI<C: Config> {
    client: Client<C>,
    model: String,
    options: CallOptions,
}

impl<C: Config> OpenAI<C> {
    pub fn new(client: Client<C>, model: impl Into<String>, options: CallOptions) -> Self {
        Self {
            client,
            model: model.into(),
            options,
        }
    }

    pub fn with_config(config: C) -> Self {
        Self::new(
            Client::with_config(config),
            OpenAIModel::Gpt4oMini,
            CallOptions::default(),
        )
    }

    pub fn with_model<S: Into<String>>(mut self, model: S) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_options(mut self, options: CallOptions) -> Self {
        self.options = options;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn build_request(
        &self,
        prompt: &str,
        options: &CallOptions,
        stream: bool,
    ) -> Result<CreateChatCompletionRequest, LLMError> {
        let options = self.options.merged_with(options);
        let message = ChatCompletionRequestUserMessageArgs::default()
            .content(prompt)
            .build()?;

        let mut builder = CreateChatCompletionRequestArgs::default();
        builder.model(&self.model).messages(vec![message.into()]);

        if let Some(stop_words) = options.stop_words.filter(|s| !s.is_empty()) {
            builder.stop(Stop::StringArray(stop_words));
        }
        if let Some(max_tokens) = options.max_tokens {
            builder.max_completion_tokens(max_tokens);
        }
        if let Some(temperature) = options.temperature {
            builder.temperature(temperature);
        }
        if stream {
            builder.stream(true);
        }

        Ok(builder.build()?)
    }
}

impl OpenAI<OpenAIConfig> {
    pub fn builder() -> super::OpenAIBuilder<OpenAIConfig> {
        super::OpenAIBuilder::default()
    }
}

impl Default for OpenAI<OpenAIConfig> {
    fn default() -> Self {
        Self::with_config(OpenAIConfig::default())
    }
}

#[async_trait]
impl<C: Config + Send + Sync + 'static> LLM for OpenAI<C> {
    async fn generate(&self, prompt: &str, options: &CallOptions) -> Result<String, LLMError> {
        let request = self.build_request(prompt, options, false)?;
        let response = self.client.chat().create(request).await?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| LLMError::ContentNotFound("/choices/0/message/content".into()))
    }

    async fn stream(&self, prompt: &str, options: &CallOptions) -> Result<LLMStream, LLMError> {
        let request = self.build_request(prompt, options, true)?;
        let stream = self.client.chat().create_stream(request).await?;

        let tokens = stream.map(|chunk| -> Result<String, LLMError> {
            let chunk = chunk?;
            Ok(chunk
                .choices
                .into_iter()
                .next()
                .and_then(|choice| choice.delta.content)
                .unwrap_or_default())
        });

        Ok(Box::pin(tokens))
    }
}
