use async_openai::{
    config::{Config, OpenAIConfig},
    Client,
};

use crate::llm::options::CallOptions;

use super::{OpenAI, OpenAIModel};

/// Configures an [`OpenAI`] completion service.
///
/// Sampling settings given here are the defaults for every call; options passed by the
/// planner (stop words in particular) take precedence.
pub struct OpenAIBuilder<C: Config> {
    config: C,
    model: String,
    defaults: CallOptions,
    http_client: Option<reqwest::Client>,
}

impl<C: Config + Default> Default for OpenAIBuilder<C> {
    fn default() -> Self {
        Self::new(C::default())
    }
}

impl<C: Config> OpenAIBuilder<C> {
    pub fn new(config: C) -> Self {
        Self {
            config,
            model: OpenAIModel::Gpt4oMini.to_string(),
            defaults: CallOptions::default(),
            http_client: None,
        }
    }

    pub fn with_config(mut self, config: C) -> Self {
        self.config = config;
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.defaults.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.defaults.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_default_options(mut self, defaults: CallOptions) -> Self {
        self.defaults = defaults;
        self
    }

    /// Sends requests through `http_client`, e.g. one with a proxy or connect timeout.
    pub fn with_http_client(mut self, http_client: reqwest::Client) -> Self {
        self.http_client = Some(http_client);
        self
    }

    pub fn build(self) -> OpenAI<C> {
        let mut client = Client::with_config(self.config);
        if let Some(http_client) = self.http_client {
            client = client.with_http_client(http_client);
        }

        OpenAI::new(client, self.model, self.defaults)
    }
}

impl OpenAIBuilder<OpenAIConfig> {
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.config = self.config.with_api_key(api_key);
        self
    }

    /// Points the client at an OpenAI compatible server.
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.config = self.config.with_api_base(api_base);
        self
    }
}
