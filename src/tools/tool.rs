use std::sync::Arc;

use async_trait::async_trait;

use super::ToolError;

/// A capability the agent can invoke by name.
///
/// The name is the dispatch key and appears verbatim in prompts. Tools are shared
/// across concurrent runs, so any interior state must be synchronised by the tool.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Returns the name of the tool.
    fn name(&self) -> String;

    /// Provides a description of what the tool does and when to use it.
    fn description(&self) -> String;

    /// When true, the observation of this tool becomes the final answer.
    fn return_direct(&self) -> bool {
        false
    }

    /// Runs the tool on the caller's thread.
    fn run(&self, input: &str) -> Result<String, ToolError>;

    /// Whether [`Tool::arun`] is a native async implementation.
    ///
    /// Tools that return false are moved to the blocking thread pool when the agent runs
    /// in async mode.
    fn is_async(&self) -> bool {
        false
    }

    async fn arun(&self, input: &str) -> Result<String, ToolError> {
        self.run(input)
    }

    fn to_plain_description(&self) -> String {
        format!("{}: {}", self.name(), self.description())
    }

    fn into_shared(self) -> Arc<dyn Tool>
    where
        Self: Sized + 'static,
    {
        Arc::new(self)
    }
}
