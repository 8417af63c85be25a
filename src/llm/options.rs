/// Per-call settings for a completion request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CallOptions {
    pub stop_words: Option<Vec<String>>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
}

impl CallOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_stop_words(mut self, stop_words: Vec<String>) -> Self {
        self.stop_words = Some(stop_words);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Returns these options overridden by every field set in `other`.
    pub fn merged_with(&self, other: &CallOptions) -> CallOptions {
        CallOptions {
            stop_words: other.stop_words.clone().or_else(|| self.stop_words.clone()),
            max_tokens: other.max_tokens.or(self.max_tokens),
            temperature: other.temperature.or(self.temperature),
        }
    }
}
