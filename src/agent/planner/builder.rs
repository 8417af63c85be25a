use std::{sync::Arc, time::Duration};

use crate::{
    agent::{AgentBehavior, AgentError, PromptParts, QaAgent},
    llm::{CallOptions, LLM},
    schemas::DEFAULT_OUTPUT_KEY,
    template::PromptTemplate,
    tools::ToolRegistry,
};

use super::AgentPlanner;

pub const DEFAULT_MAX_FIX_ATTEMPTS: usize = 3;

pub struct AgentPlannerBuilder {
    behavior: Option<Arc<dyn AgentBehavior>>,
    prompt_parts: Option<PromptParts>,
    prompt: Option<PromptTemplate>,
    return_values: Option<Vec<String>>,
    max_fix_attempts: usize,
    request_timeout: Option<Duration>,
    streaming: bool,
    call_options: CallOptions,
}

impl AgentPlannerBuilder {
    pub fn new() -> Self {
        Self {
            behavior: None,
            prompt_parts: None,
            prompt: None,
            return_values: None,
            max_fix_attempts: DEFAULT_MAX_FIX_ATTEMPTS,
            request_timeout: None,
            streaming: false,
            call_options: CallOptions::default(),
        }
    }

    /// Agent kind, defaults to [`QaAgent`].
    pub fn behavior(mut self, behavior: Arc<dyn AgentBehavior>) -> Self {
        self.behavior = Some(behavior);
        self
    }

    /// Replaces the kind's default prefix, instructions or suffix.
    pub fn prompt_parts(mut self, prompt_parts: PromptParts) -> Self {
        self.prompt_parts = Some(prompt_parts);
        self
    }

    /// Uses a complete prompt instead of assembling one from parts. The allowed tools
    /// are left unset, since the prompt is not derived from the tools.
    pub fn prompt(mut self, prompt: PromptTemplate) -> Self {
        self.prompt = Some(prompt);
        self
    }

    pub fn return_values<S: Into<String>>(
        mut self,
        return_values: impl IntoIterator<Item = S>,
    ) -> Self {
        self.return_values = Some(return_values.into_iter().map(Into::into).collect());
        self
    }

    pub fn max_fix_attempts(mut self, max_fix_attempts: usize) -> Self {
        self.max_fix_attempts = max_fix_attempts;
        self
    }

    pub fn request_timeout(mut self, request_timeout: Duration) -> Self {
        self.request_timeout = Some(request_timeout);
        self
    }

    /// Reads completions as token streams, reporting each chunk to the callbacks.
    pub fn streaming(mut self, streaming: bool) -> Self {
        self.streaming = streaming;
        self
    }

    /// Options sent with every completion. The agent's own stop words are appended to
    /// any stop words given here.
    pub fn call_options(mut self, call_options: CallOptions) -> Self {
        self.call_options = call_options;
        self
    }

    pub fn build<L: LLM + 'static>(
        self,
        llm: L,
        tools: &ToolRegistry,
    ) -> Result<AgentPlanner, AgentError> {
        let behavior = self
            .behavior
            .unwrap_or_else(|| Arc::new(QaAgent::new()) as Arc<dyn AgentBehavior>);
        behavior.validate_tools(tools)?;

        let (prompt, allowed_tools) = match self.prompt {
            Some(prompt) => (prompt.ensure_scratchpad(), None),
            None => {
                let parts = self
                    .prompt_parts
                    .unwrap_or_else(|| behavior.default_prompt_parts());
                (behavior.create_prompt(tools, &parts)?, Some(tools.names()))
            }
        };

        let return_values = self
            .return_values
            .filter(|values| !values.is_empty())
            .unwrap_or_else(|| vec![DEFAULT_OUTPUT_KEY.to_string()]);

        Ok(AgentPlanner {
            llm: Arc::new(llm),
            behavior,
            prompt,
            allowed_tools,
            return_values,
            max_fix_attempts: self.max_fix_attempts,
            request_timeout: self.request_timeout,
            streaming: self.streaming,
            call_options: self.call_options,
        })
    }
}

impl Default for AgentPlannerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
