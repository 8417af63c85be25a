use std::time::Duration;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// What to return when the iteration cap is reached without a final answer.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum EarlyStoppingMethod {
    /// Return a fixed message.
    #[default]
    Force,
    /// Ask the model once more for a final answer from the steps so far.
    Generate,
}

/// How a failing tool call affects the run.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ToolErrorPolicy {
    /// The error becomes the observation and the loop continues.
    #[default]
    Observe,
    /// The run ends with the tool error.
    Propagate,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExecutorOptions {
    pub max_iterations: Option<usize>,
    pub early_stopping_method: EarlyStoppingMethod,
    pub return_intermediate_steps: bool,
    pub tool_error_policy: ToolErrorPolicy,
    pub tool_timeout: Option<Duration>,
    pub verbose: bool,
}

impl ExecutorOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = Some(max_iterations);
        self
    }

    pub fn without_max_iterations(mut self) -> Self {
        self.max_iterations = None;
        self
    }

    pub fn with_early_stopping_method(mut self, method: EarlyStoppingMethod) -> Self {
        self.early_stopping_method = method;
        self
    }

    pub fn with_return_intermediate_steps(mut self, return_intermediate_steps: bool) -> Self {
        self.return_intermediate_steps = return_intermediate_steps;
        self
    }

    pub fn with_tool_error_policy(mut self, policy: ToolErrorPolicy) -> Self {
        self.tool_error_policy = policy;
        self
    }

    /// Limit for a single tool call. Synchronous tools are only interrupted in async
    /// runs, where they execute on the blocking pool.
    pub fn with_tool_timeout(mut self, tool_timeout: Duration) -> Self {
        self.tool_timeout = Some(tool_timeout);
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }
}

impl Default for ExecutorOptions {
    fn default() -> Self {
        Self {
            max_iterations: Some(10),
            early_stopping_method: EarlyStoppingMethod::Force,
            return_intermediate_steps: false,
            tool_error_policy: ToolErrorPolicy::Observe,
            tool_timeout: None,
            verbose: false,
        }
    }
}
