use std::{str::FromStr, sync::Arc};

use crate::{
    agent::{AgentError, AgentExecutor, AgentPlannerBuilder, AgentType, ExecutorOptions},
    llm::LLM,
    tools::{Tool, ToolRegistry},
};

/// Builds a planner of the named kind over `tools` and wraps it in an executor.
///
/// `agent_type` is one of `qa-bot`, `chat-bot` or `persona-bot`.
pub fn initialize_agent<L: LLM + 'static>(
    agent_type: &str,
    tools: impl IntoIterator<Item = Arc<dyn Tool>>,
    llm: L,
    options: ExecutorOptions,
) -> Result<AgentExecutor, AgentError> {
    let agent_type = AgentType::from_str(agent_type)
        .map_err(|_| AgentError::UnknownAgentType(agent_type.to_string()))?;
    let tools = ToolRegistry::new(tools)?;

    let planner = AgentPlannerBuilder::new()
        .behavior(agent_type.behavior(None))
        .build(llm, &tools)?;

    AgentExecutor::new(planner, tools, options)
}
