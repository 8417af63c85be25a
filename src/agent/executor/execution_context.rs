use std::sync::Arc;

use uuid::Uuid;

use crate::{
    agent::{planner::PlanTrace, AgentError, AgentExecutor, ToolErrorPolicy},
    schemas::{AgentAction, AgentEvent, AgentFinish, AgentStep, TextReplacements},
    tools::{InvalidTool, Tool, ToolError},
};

use super::ExecutorOutput;

const CHAT_HISTORY_VARIABLE: &str = "chat_history";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchMode {
    /// Sync tools run on the blocking pool.
    Async,
    /// Sync tools run inline on the calling thread.
    Blocking,
}

/// Mutable state of one [`AgentExecutor`] run.
///
/// * `steps` - actions taken so far, with their observations
/// * `iterations` - completed plan and dispatch rounds
/// * `run_id` - tags every callback event of this run
pub struct ExecutionContext<'exec> {
    executor: &'exec AgentExecutor,
    inputs: TextReplacements,
    steps: Vec<AgentStep>,
    iterations: usize,
    run_id: Uuid,
    mode: DispatchMode,
}

impl<'exec> ExecutionContext<'exec> {
    pub fn new(executor: &'exec AgentExecutor, inputs: TextReplacements, mode: DispatchMode) -> Self {
        Self {
            executor,
            inputs,
            steps: Vec::new(),
            iterations: 0,
            run_id: Uuid::new_v4(),
            mode,
        }
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Plans and dispatches until the agent finishes, a tool returns directly, or the
    /// iteration cap triggers early stopping.
    pub async fn start(mut self) -> Result<ExecutorOutput, AgentError> {
        self.load_memory().await;
        let verbose = self.executor.options.verbose;
        self.executor
            .callbacks()
            .on_chain_start(self.run_id, &self.inputs, verbose);

        match self.run_loop().await {
            Ok(finish) => {
                log::debug!("\nAgent finished with result:\n{}", finish.log);
                self.executor
                    .callbacks()
                    .on_agent_finish(self.run_id, &finish, verbose);
                self.save_memory(&finish).await;
                self.executor
                    .callbacks()
                    .on_chain_end(self.run_id, &finish.return_values, verbose);
                Ok(self.into_output(finish))
            }
            Err(e) => {
                self.executor
                    .callbacks()
                    .on_chain_error(self.run_id, &e, verbose);
                Err(e)
            }
        }
    }

    async fn run_loop(&mut self) -> Result<AgentFinish, AgentError> {
        let executor = self.executor;
        let planner = &executor.planner;

        while self.should_continue() {
            let event = planner
                .plan_traced(&self.steps, &self.inputs, Some(self.trace()))
                .await?;

            let action = match event {
                AgentEvent::Finish(finish) => return Ok(finish),
                AgentEvent::Action(action) => action,
            };
            executor
                .callbacks()
                .on_agent_action(self.run_id, &action, executor.options.verbose);

            let (observation, return_direct) = self.dispatch(&action).await?;
            let behavior = planner.behavior();
            let llm_prefix = if return_direct { "" } else { behavior.llm_prefix() };
            executor.callbacks().on_text(
                self.run_id,
                &format!("{}{observation}\n{llm_prefix}", behavior.observation_prefix()),
                executor.options.verbose,
            );
            self.steps.push(AgentStep::new(action, observation.clone()));
            if return_direct {
                return Ok(AgentFinish::with_output(
                    planner.output_key(),
                    observation,
                    "",
                ));
            }
            self.iterations += 1;
        }

        log::warn!(
            "Agent stopped after {} iterations, applying {} early stopping",
            self.iterations,
            executor.options.early_stopping_method
        );
        planner
            .return_stopped_response_traced(
                executor.options.early_stopping_method,
                &self.steps,
                &self.inputs,
                Some(self.trace()),
            )
            .await
    }

    fn should_continue(&self) -> bool {
        match self.executor.options.max_iterations {
            Some(max_iterations) => self.iterations < max_iterations,
            None => true,
        }
    }

    fn trace(&self) -> PlanTrace<'exec> {
        PlanTrace {
            run_id: self.run_id,
            callbacks: self.executor.callbacks(),
            verbose: self.executor.options.verbose,
        }
    }

    /// Returns the observation and whether it should end the run.
    async fn dispatch(&self, action: &AgentAction) -> Result<(String, bool), AgentError> {
        let callbacks = self.executor.callbacks();
        let verbose = self.executor.options.verbose;

        let Some(tool) = self.executor.tools.lookup(&action.tool) else {
            log::warn!("Tried to use nonexistent tool '{}'", action.tool);
            let invalid = InvalidTool;
            callbacks.on_tool_start(self.run_id, &invalid.name(), &action.tool, verbose);
            let observation = invalid.run(&action.tool)?;
            callbacks.on_tool_end(self.run_id, &invalid.name(), &observation, verbose);
            return Ok((observation, false));
        };

        log::debug!("\nTool call:\n{action}");
        callbacks.on_tool_start(self.run_id, &action.tool, &action.tool_input, verbose);

        match self.call_tool(tool, &action.tool_input).await {
            Ok(observation) => {
                log::debug!("\nTool {} result:\n{}", action.tool, observation);
                callbacks.on_tool_end(self.run_id, &action.tool, &observation, verbose);
                Ok((observation, tool.return_direct()))
            }
            Err(e) => {
                log::warn!("Tool '{}' error: {e}", action.tool);
                callbacks.on_tool_error(self.run_id, &action.tool, &e, verbose);
                match self.executor.options.tool_error_policy {
                    ToolErrorPolicy::Observe => Ok((tool_failure_observation(&e), false)),
                    ToolErrorPolicy::Propagate => Err(e.into()),
                }
            }
        }
    }

    async fn call_tool(&self, tool: &Arc<dyn Tool>, input: &str) -> Result<String, ToolError> {
        let call = async {
            if tool.is_async() {
                return tool.arun(input).await;
            }
            match self.mode {
                DispatchMode::Blocking => tool.run(input),
                DispatchMode::Async => {
                    let tool = Arc::clone(tool);
                    let input = input.to_string();
                    tokio::task::spawn_blocking(move || tool.run(&input))
                        .await
                        .map_err(|e| ToolError::TaskFailed(e.to_string()))?
                }
            }
        };

        match self.executor.options.tool_timeout {
            Some(limit) => tokio::time::timeout(limit, call)
                .await
                .map_err(|_| ToolError::Timeout(limit))?,
            None => call.await,
        }
    }

    async fn load_memory(&mut self) {
        if self.inputs.contains_key(CHAT_HISTORY_VARIABLE) {
            return;
        }
        let behavior = self.executor.planner.behavior();
        let history = match &self.executor.memory {
            Some(memory) => memory
                .read()
                .await
                .history(behavior.human_prefix(), behavior.ai_prefix()),
            None if self.executor.planner.prompt().has_variable(CHAT_HISTORY_VARIABLE) => {
                String::new()
            }
            None => return,
        };
        self.inputs
            .insert(CHAT_HISTORY_VARIABLE.to_string(), history);
    }

    async fn save_memory(&self, finish: &AgentFinish) {
        let Some(memory) = &self.executor.memory else {
            return;
        };
        let (Some(input), Some(output)) = (
            self.inputs.get("input"),
            finish.return_values.get(self.executor.planner.output_key()),
        ) else {
            return;
        };
        memory.write().await.save_exchange(input, output);
    }

    fn into_output(self, finish: AgentFinish) -> ExecutorOutput {
        ExecutorOutput {
            output_key: self.executor.planner.output_key().to_string(),
            return_values: finish.return_values,
            intermediate_steps: self
                .executor
                .options
                .return_intermediate_steps
                .then_some(self.steps),
        }
    }
}

fn tool_failure_observation(error: &ToolError) -> String {
    format!(
        "Tool call failed: {error}\nIf the error doesn't make sense to you, it means that the tool is broken. DO NOT use this tool again."
    )
}
