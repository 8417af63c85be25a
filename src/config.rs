use std::{collections::HashMap, str::FromStr, sync::Arc, time::Duration};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    agent::{
        AgentError, AgentExecutor, AgentPlannerBuilder, AgentType, EarlyStoppingMethod,
        ExecutorOptions, ToolErrorPolicy, DEFAULT_MAX_FIX_ATTEMPTS,
    },
    llm::LLM,
    tools::{Tool, ToolRegistry},
};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Unknown early_stopping_method `{0}`, expected `force` or `generate`")]
    InvalidEarlyStopping(String),

    #[error("Unknown agent type `{0}`")]
    UnknownAgentType(String),
}

/// Agent settings as they appear in a JSON config file.
///
/// Entries under `tools` are handed untouched to tool constructors, keyed by tool name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentConfig {
    #[serde(default = "default_agent")]
    pub agent: String,

    /// `null` removes the cap.
    #[serde(default = "default_max_iterations")]
    pub max_iterations: Option<usize>,

    #[serde(default = "default_early_stopping_method")]
    pub early_stopping_method: String,

    #[serde(default)]
    pub return_intermediate_steps: bool,

    #[serde(default = "default_max_fix_attempts")]
    pub max_fix_attempts: usize,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout_secs: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_timeout_secs: Option<u64>,

    #[serde(default)]
    pub tool_error_policy: ToolErrorPolicy,

    /// Speaker name for the chat and persona agents.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_prefix: Option<String>,

    #[serde(default)]
    pub verbose: bool,

    #[serde(default)]
    pub tools: HashMap<String, serde_json::Value>,
}

fn default_agent() -> String {
    AgentType::default().to_string()
}
fn default_max_iterations() -> Option<usize> {
    Some(10)
}
fn default_early_stopping_method() -> String {
    EarlyStoppingMethod::default().to_string()
}
fn default_max_fix_attempts() -> usize {
    DEFAULT_MAX_FIX_ATTEMPTS
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            agent: default_agent(),
            max_iterations: default_max_iterations(),
            early_stopping_method: default_early_stopping_method(),
            return_intermediate_steps: false,
            max_fix_attempts: default_max_fix_attempts(),
            request_timeout_secs: None,
            tool_timeout_secs: None,
            tool_error_policy: ToolErrorPolicy::default(),
            ai_prefix: None,
            verbose: false,
            tools: HashMap::new(),
        }
    }
}

impl AgentConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn agent_type(&self) -> Result<AgentType, ConfigError> {
        AgentType::from_str(&self.agent).map_err(|_| ConfigError::UnknownAgentType(self.agent.clone()))
    }

    pub fn early_stopping(&self) -> Result<EarlyStoppingMethod, ConfigError> {
        EarlyStoppingMethod::from_str(&self.early_stopping_method)
            .map_err(|_| ConfigError::InvalidEarlyStopping(self.early_stopping_method.clone()))
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    pub fn executor_options(&self) -> Result<ExecutorOptions, ConfigError> {
        Ok(ExecutorOptions {
            max_iterations: self.max_iterations,
            early_stopping_method: self.early_stopping()?,
            return_intermediate_steps: self.return_intermediate_steps,
            tool_error_policy: self.tool_error_policy,
            tool_timeout: self.tool_timeout_secs.map(Duration::from_secs),
            verbose: self.verbose,
        })
    }

    /// Opaque settings for the tool called `name`.
    pub fn tool_config(&self, name: &str) -> Option<&serde_json::Value> {
        self.tools.get(name)
    }

    /// Builds the configured agent over `tools`.
    pub fn build_executor<L: LLM + 'static>(
        &self,
        tools: impl IntoIterator<Item = Arc<dyn Tool>>,
        llm: L,
    ) -> Result<AgentExecutor, AgentError> {
        let agent_type = self.agent_type()?;
        let options = self.executor_options()?;
        let tools = ToolRegistry::new(tools)?;

        let mut builder = AgentPlannerBuilder::new()
            .behavior(agent_type.behavior(self.ai_prefix.as_deref()))
            .max_fix_attempts(self.max_fix_attempts);
        if let Some(timeout) = self.request_timeout() {
            builder = builder.request_timeout(timeout);
        }
        let planner = builder.build(llm, &tools)?;

        AgentExecutor::new(planner, tools, options)
    }
}
