use std::{collections::HashMap, sync::Arc};

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use super::{DispatchMode, ExecutionContext, ExecutorOptions};
use crate::{
    agent::{AgentError, AgentPlanner},
    callbacks::CallbackManager,
    memory::Memory,
    schemas::{AgentStep, TextReplacements, DEFAULT_OUTPUT_KEY},
    tools::ToolRegistry,
};

/// Result of a finished run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutorOutput {
    pub return_values: HashMap<String, String>,
    /// Present when the executor was asked to return intermediate steps.
    pub intermediate_steps: Option<Vec<AgentStep>>,
    /// Key of the primary return value, taken from the planner.
    #[serde(default = "default_output_key")]
    pub output_key: String,
}

fn default_output_key() -> String {
    DEFAULT_OUTPUT_KEY.to_string()
}

impl ExecutorOutput {
    pub fn output(&self) -> Option<&str> {
        self.return_values
            .get(&self.output_key)
            .map(String::as_str)
    }
}

/// Drives the plan, dispatch and observe loop for a planner and its tools.
///
/// The executor is immutable while running; every run gets its own
/// [`ExecutionContext`], so one executor can serve concurrent runs.
pub struct AgentExecutor {
    pub(super) planner: AgentPlanner,
    pub(super) tools: ToolRegistry,
    pub(super) memory: Option<Arc<RwLock<dyn Memory>>>,
    pub(super) callbacks: Option<Arc<CallbackManager>>,
    pub(super) options: ExecutorOptions,
}

impl AgentExecutor {
    /// Fails when the planner was built for a different set of tools.
    pub fn new(
        planner: AgentPlanner,
        tools: ToolRegistry,
        options: ExecutorOptions,
    ) -> Result<Self, AgentError> {
        if let Some(allowed) = planner.allowed_tools() {
            tools
                .check_allowed(allowed)
                .map_err(|e| AgentError::ToolValidation(e.to_string()))?;
        }

        Ok(Self {
            planner,
            tools,
            memory: None,
            callbacks: None,
            options,
        })
    }

    pub fn with_memory(mut self, memory: Arc<RwLock<dyn Memory>>) -> Self {
        self.memory = Some(memory);
        self
    }

    /// Without an explicit manager, events go to [`CallbackManager::global`].
    pub fn with_callbacks(mut self, callbacks: Arc<CallbackManager>) -> Self {
        self.callbacks = Some(callbacks);
        self
    }

    pub fn planner(&self) -> &AgentPlanner {
        &self.planner
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    pub fn options(&self) -> &ExecutorOptions {
        &self.options
    }

    pub fn callbacks(&self) -> &CallbackManager {
        match &self.callbacks {
            Some(callbacks) => callbacks,
            None => CallbackManager::global(),
        }
    }

    pub fn execution(&self, inputs: TextReplacements) -> ExecutionContext<'_> {
        ExecutionContext::new(self, inputs, DispatchMode::Async)
    }

    /// Runs the loop, awaiting async tools and moving sync tools to the blocking pool.
    pub async fn run(&self, inputs: TextReplacements) -> Result<ExecutorOutput, AgentError> {
        self.execution(inputs).start().await
    }

    /// Runs the loop to completion on the calling thread.
    ///
    /// Sync tools are called inline. Must not be called from within an async runtime.
    pub fn run_blocking(&self, inputs: TextReplacements) -> Result<ExecutorOutput, AgentError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        runtime.block_on(ExecutionContext::new(self, inputs, DispatchMode::Blocking).start())
    }

    /// Runs with `input` as the only input and returns the primary output.
    pub async fn invoke(&self, input: &str) -> Result<String, AgentError> {
        let inputs = TextReplacements::from([("input".to_string(), input.to_string())]);
        let output = self.run(inputs).await?;
        output
            .output()
            .map(str::to_string)
            .ok_or_else(|| AgentError::OtherError("Run finished without an output".into()))
    }
}

#[cfg(test)]
mod tests {
    use std::{
        sync::{Arc, Mutex},
        time::Duration,
    };

    use async_trait::async_trait;
    use indoc::indoc;
    use uuid::Uuid;

    use crate::{
        agent::{
            AgentBehavior, AgentPlannerBuilder, ChatAgent, EarlyStoppingMethod, QaAgent,
            ToolErrorPolicy, STOPPED_RESPONSE,
        },
        callbacks::{CallbackHandler, CallbackResult},
        llm::{CallOptions, FakeLLM, LLMError},
        memory::SimpleMemory,
        schemas::{AgentAction, AgentFinish},
        text_replacements,
        tools::{Calculator, Tool, ToolError},
    };

    use super::*;

    struct BrokenTool;

    impl Tool for BrokenTool {
        fn name(&self) -> String {
            "Broken".into()
        }

        fn description(&self) -> String {
            "Always fails.".into()
        }

        fn run(&self, _input: &str) -> Result<String, ToolError> {
            Err(ToolError::InvalidInput("boom".into()))
        }
    }

    struct SleepyTool {
        native_async: bool,
    }

    #[async_trait]
    impl Tool for SleepyTool {
        fn name(&self) -> String {
            "Sleepy".into()
        }

        fn description(&self) -> String {
            "Takes a while to answer.".into()
        }

        fn run(&self, _input: &str) -> Result<String, ToolError> {
            std::thread::sleep(Duration::from_millis(200));
            Ok("awake".into())
        }

        fn is_async(&self) -> bool {
            self.native_async
        }

        async fn arun(&self, _input: &str) -> Result<String, ToolError> {
            tokio::time::sleep(Duration::from_millis(200)).await;
            Ok("awake".into())
        }
    }

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<String>>,
    }

    impl Recorder {
        fn push(&self, event: String) -> CallbackResult {
            self.events.lock().unwrap().push(event);
            Ok(())
        }

        fn events(&self) -> Vec<String> {
            self.events.lock().unwrap().clone()
        }
    }

    impl CallbackHandler for Recorder {
        fn always_verbose(&self) -> bool {
            true
        }

        fn on_agent_action(&self, _run_id: Uuid, action: &AgentAction) -> CallbackResult {
            self.push(format!("action:{}", action.tool))
        }

        fn on_tool_end(&self, _run_id: Uuid, tool: &str, output: &str) -> CallbackResult {
            self.push(format!("tool_end:{tool}:{output}"))
        }

        fn on_text(&self, _run_id: Uuid, text: &str) -> CallbackResult {
            self.push(format!("text:{text}"))
        }

        fn on_agent_finish(&self, _run_id: Uuid, finish: &AgentFinish) -> CallbackResult {
            self.push(format!("finish:{}", finish.output().unwrap_or_default()))
        }
    }

    fn qa() -> Arc<dyn AgentBehavior> {
        Arc::new(QaAgent::new())
    }

    fn executor(
        llm: &Arc<FakeLLM>,
        behavior: Arc<dyn AgentBehavior>,
        tools: Vec<Arc<dyn Tool>>,
        options: ExecutorOptions,
    ) -> AgentExecutor {
        let tools = ToolRegistry::new(tools).unwrap();
        let planner = AgentPlannerBuilder::new()
            .behavior(behavior)
            .build(llm.clone(), &tools)
            .unwrap();
        AgentExecutor::new(planner, tools, options)
            .unwrap()
            .with_callbacks(Arc::new(CallbackManager::default()))
    }

    fn question(text: &str) -> TextReplacements {
        text_replacements! { "input" => text }
    }

    const ADD: &str = " I need to add.\nAction: Calculator\nAction Input: 2+2";

    #[tokio::test]
    async fn test_calculator_scenario() {
        let llm = Arc::new(FakeLLM::new([
            ADD,
            " I now know the final answer\nFinal Answer: 4",
        ]));
        let executor = executor(
            &llm,
            qa(),
            vec![Calculator::default().into_shared()],
            ExecutorOptions::default()
                .with_max_iterations(2)
                .with_early_stopping_method(EarlyStoppingMethod::Generate),
        );

        let output = executor.run(question("What is 2+2?")).await.unwrap();

        assert_eq!(
            output.return_values,
            HashMap::from([("output".to_string(), "4".to_string())])
        );
        assert_eq!(output.intermediate_steps, None);
        assert_eq!(llm.call_count(), 2);
    }

    #[tokio::test]
    async fn test_stop_words_follow_observation_prefix() {
        let llm = Arc::new(FakeLLM::new(["Final Answer: hi"]));
        let executor = executor(&llm, qa(), vec![], ExecutorOptions::default());

        executor.run(question("hello")).await.unwrap();

        assert_eq!(
            llm.calls()[0].stop_words,
            vec!["\nObservation:".to_string(), "\n\tObservation:".to_string()]
        );
    }

    #[tokio::test]
    async fn test_force_stop_after_max_iterations() {
        for max_iterations in 1..=3 {
            let llm = Arc::new(FakeLLM::new(vec![ADD; 5]));
            let executor = executor(
                &llm,
                qa(),
                vec![Calculator::default().into_shared()],
                ExecutorOptions::default()
                    .with_max_iterations(max_iterations)
                    .with_return_intermediate_steps(true),
            );

            let output = executor.run(question("loop forever")).await.unwrap();

            assert_eq!(output.output(), Some(STOPPED_RESPONSE));
            assert_eq!(llm.call_count(), max_iterations);
            assert_eq!(output.intermediate_steps.unwrap().len(), max_iterations);
        }
    }

    #[tokio::test]
    async fn test_generate_stop_returns_unparsable_text() {
        let llm = Arc::new(FakeLLM::new([ADD, ADD, "I think it is probably 4"]));
        let executor = executor(
            &llm,
            qa(),
            vec![Calculator::default().into_shared()],
            ExecutorOptions::default()
                .with_max_iterations(2)
                .with_early_stopping_method(EarlyStoppingMethod::Generate),
        );

        let output = executor.run(question("What is 2+2?")).await.unwrap();

        assert_eq!(output.output(), Some("I think it is probably 4"));
        assert_eq!(llm.call_count(), 3);
        assert!(llm.last_prompt().unwrap().ends_with(
            "\nObservation: 4\nThought:\n\nI now need to return a final answer based on the previous steps:"
        ));
    }

    #[tokio::test]
    async fn test_generate_stop_extracts_final_answer() {
        let llm = Arc::new(FakeLLM::new([ADD, " Final Answer: 4"]));
        let executor = executor(
            &llm,
            qa(),
            vec![Calculator::default().into_shared()],
            ExecutorOptions::default()
                .with_max_iterations(1)
                .with_early_stopping_method(EarlyStoppingMethod::Generate),
        );

        let output = executor.run(question("What is 2+2?")).await.unwrap();

        assert_eq!(output.output(), Some("4"));
        assert_eq!(llm.call_count(), 2);
    }

    #[tokio::test]
    async fn test_invalid_tool_is_observed() {
        let llm = Arc::new(FakeLLM::new(["Action: Search\nAction Input: weather"]));
        let executor = executor(
            &llm,
            qa(),
            vec![Calculator::default().into_shared()],
            ExecutorOptions::default()
                .with_max_iterations(1)
                .with_return_intermediate_steps(true),
        );

        let output = executor.run(question("weather?")).await.unwrap();
        let steps = output.intermediate_steps.clone().unwrap();

        assert_eq!(steps.len(), 1);
        assert_eq!(
            steps[0].observation,
            "Search is not a valid tool, try another one."
        );
        assert_eq!(output.output(), Some(STOPPED_RESPONSE));
        assert_eq!(llm.call_count(), 1);
    }

    #[tokio::test]
    async fn test_return_direct_short_circuits() {
        let llm = Arc::new(FakeLLM::new([ADD, "Final Answer: never reached"]));
        let executor = executor(
            &llm,
            qa(),
            vec![Calculator::new().with_return_direct(true).into_shared()],
            ExecutorOptions::default().with_return_intermediate_steps(true),
        );

        let output = executor.run(question("What is 2+2?")).await.unwrap();

        assert_eq!(output.output(), Some("4"));
        assert_eq!(output.intermediate_steps.unwrap().len(), 1);
        assert_eq!(llm.call_count(), 1);
    }

    #[tokio::test]
    async fn test_failed_return_direct_tool_keeps_planning() {
        let llm = Arc::new(FakeLLM::new([
            "Action: Calculator\nAction Input: 2+",
            "Final Answer: could not compute",
        ]));
        let executor = executor(
            &llm,
            qa(),
            vec![Calculator::new().with_return_direct(true).into_shared()],
            ExecutorOptions::default(),
        );

        let output = executor.run(question("What is 2+?")).await.unwrap();

        assert_eq!(output.output(), Some("could not compute"));
        assert_eq!(llm.call_count(), 2);
    }

    #[tokio::test]
    async fn test_scratchpad_round_trip() {
        let multiply = " Now multiply.\nAction: Calculator\nAction Input: \"4*3\"";
        let llm = Arc::new(FakeLLM::new([
            ADD,
            multiply,
            " I now know the final answer\nFinal Answer: 12",
        ]));
        let executor = executor(
            &llm,
            qa(),
            vec![Calculator::default().into_shared()],
            ExecutorOptions::default().with_return_intermediate_steps(true),
        );

        let output = executor.run(question("(2+2)*3?")).await.unwrap();
        let steps = output.intermediate_steps.unwrap();

        let expected = format!(
            "{ADD}\nObservation: 4\nThought:{multiply}\nObservation: 12\nThought:"
        );
        assert_eq!(executor.planner().construct_scratchpad(&steps), expected);

        let calls = llm.calls();
        assert!(calls[0].prompt.ends_with("Question: (2+2)*3?\nThought:"));
        assert!(calls[2]
            .prompt
            .ends_with(&format!("Question: (2+2)*3?\nThought:{expected}")));
        assert_eq!(steps[1].action.tool_input, "4*3");
    }

    #[tokio::test]
    async fn test_action_on_finish_tool_is_a_finish() {
        let llm = Arc::new(FakeLLM::new(["Action: Final Answer\nAction Input: 4"]));
        let executor = executor(&llm, qa(), vec![], ExecutorOptions::default());

        let output = executor.run(question("What is 2+2?")).await.unwrap();

        assert_eq!(output.output(), Some("4"));
    }

    #[tokio::test]
    async fn test_qa_parse_failure_is_fatal() {
        let llm = Arc::new(FakeLLM::new(["I am not sure", "Final Answer: 4"]));
        let executor = executor(&llm, qa(), vec![], ExecutorOptions::default());

        let result = executor.run(question("What is 2+2?")).await;

        assert!(matches!(result, Err(AgentError::ParseError(_))));
        assert_eq!(llm.call_count(), 1);
    }

    #[tokio::test]
    async fn test_chat_fix_up_recovers() {
        let llm = Arc::new(FakeLLM::new([
            "Thought: Do I need to use a tool? No",
            " Hello there!",
        ]));
        let executor = executor(
            &llm,
            Arc::new(ChatAgent::default()),
            vec![],
            ExecutorOptions::default(),
        );

        let output = executor.run(question("hi")).await.unwrap();

        assert_eq!(output.output(), Some("Hello there!"));
        assert_eq!(llm.call_count(), 2);
        assert!(llm
            .last_prompt()
            .unwrap()
            .ends_with("New input: hi\nThought: Do I need to use a tool? No\nAI:"));
    }

    #[tokio::test]
    async fn test_chat_fix_up_is_capped() {
        let llm = Arc::new(FakeLLM::new(["Action: Calculator", "", "", ""]));
        let tools = ToolRegistry::new([Calculator::default().into_shared()]).unwrap();
        let planner = AgentPlannerBuilder::new()
            .behavior(Arc::new(ChatAgent::default()))
            .max_fix_attempts(2)
            .build(llm.clone(), &tools)
            .unwrap();
        let executor = AgentExecutor::new(planner, tools, ExecutorOptions::default())
            .unwrap()
            .with_callbacks(Arc::new(CallbackManager::default()));

        let result = executor.run(question("hi")).await;

        assert!(matches!(result, Err(AgentError::TooManyFixAttempts(2))));
        assert_eq!(llm.call_count(), 3);
    }

    #[tokio::test]
    async fn test_tool_error_becomes_observation() {
        let llm = Arc::new(FakeLLM::new([
            "Action: Broken\nAction Input: anything",
            "Final Answer: gave up",
        ]));
        let executor = executor(
            &llm,
            qa(),
            vec![Arc::new(BrokenTool)],
            ExecutorOptions::default().with_return_intermediate_steps(true),
        );

        let output = executor.run(question("try it")).await.unwrap();
        let steps = output.intermediate_steps.unwrap();

        assert_eq!(output.return_values["output"], "gave up");
        assert!(steps[0]
            .observation
            .starts_with("Tool call failed: Invalid tool input: boom\n"));
    }

    #[tokio::test]
    async fn test_tool_error_propagates_when_configured() {
        let llm = Arc::new(FakeLLM::new(["Action: Broken\nAction Input: anything"]));
        let executor = executor(
            &llm,
            qa(),
            vec![Arc::new(BrokenTool)],
            ExecutorOptions::default().with_tool_error_policy(ToolErrorPolicy::Propagate),
        );

        let result = executor.run(question("try it")).await;

        assert!(matches!(
            result,
            Err(AgentError::ToolError(ToolError::InvalidInput(_)))
        ));
    }

    #[tokio::test]
    async fn test_tool_timeout_is_a_tool_failure() {
        for native_async in [true, false] {
            let llm = Arc::new(FakeLLM::new([
                "Action: Sleepy\nAction Input: now",
                "Final Answer: too slow",
            ]));
            let executor = executor(
                &llm,
                qa(),
                vec![Arc::new(SleepyTool { native_async })],
                ExecutorOptions::default()
                    .with_tool_timeout(Duration::from_millis(20))
                    .with_return_intermediate_steps(true),
            );

            let output = executor.run(question("wake up")).await.unwrap();
            assert_eq!(output.output(), Some("too slow"));

            let steps = output.intermediate_steps.unwrap();
            assert!(steps[0]
                .observation
                .starts_with("Tool call failed: Tool timed out after"));
        }
    }

    #[tokio::test]
    async fn test_request_timeout() {
        let llm = Arc::new(FakeLLM::new(["Final Answer: late"]).with_delay(Duration::from_millis(200)));
        let tools = ToolRegistry::default();
        let planner = AgentPlannerBuilder::new()
            .request_timeout(Duration::from_millis(10))
            .build(llm.clone(), &tools)
            .unwrap();
        let executor = AgentExecutor::new(planner, tools, ExecutorOptions::default())
            .unwrap()
            .with_callbacks(Arc::new(CallbackManager::default()));

        let result = executor.run(question("hurry")).await;

        assert!(matches!(
            result,
            Err(AgentError::LLMError(LLMError::Timeout(_)))
        ));
    }

    #[tokio::test]
    async fn test_caller_stop_words_are_kept() {
        let llm = Arc::new(FakeLLM::new(["Final Answer: hi"]));
        let tools = ToolRegistry::default();
        let planner = AgentPlannerBuilder::new()
            .call_options(
                CallOptions::new()
                    .with_stop_words(vec!["\nHuman:".into(), "\nObservation:".into()])
                    .with_temperature(0.0),
            )
            .build(llm.clone(), &tools)
            .unwrap();
        let executor = AgentExecutor::new(planner, tools, ExecutorOptions::default())
            .unwrap()
            .with_callbacks(Arc::new(CallbackManager::default()));

        executor.run(question("hello")).await.unwrap();

        assert_eq!(
            llm.calls()[0].stop_words,
            vec![
                "\nHuman:".to_string(),
                "\nObservation:".to_string(),
                "\n\tObservation:".to_string()
            ]
        );
    }

    #[tokio::test]
    async fn test_output_uses_custom_return_key() {
        let llm = Arc::new(FakeLLM::new(["Final Answer: 42", "Final Answer: 43"]));
        let tools = ToolRegistry::default();
        let planner = AgentPlannerBuilder::new()
            .return_values(["answer"])
            .build(llm.clone(), &tools)
            .unwrap();
        let executor = AgentExecutor::new(planner, tools, ExecutorOptions::default())
            .unwrap()
            .with_callbacks(Arc::new(CallbackManager::default()));

        let output = executor.run(question("meaning of life")).await.unwrap();

        assert_eq!(output.output_key, "answer");
        assert_eq!(output.output(), Some("42"));
        assert_eq!(executor.invoke("again").await.unwrap(), "43");
    }

    #[tokio::test]
    async fn test_streaming_planner_collects_chunks() {
        let llm = Arc::new(FakeLLM::new(["Thought: done\nFinal Answer: streamed answer"]));
        let tools = ToolRegistry::default();
        let planner = AgentPlannerBuilder::new()
            .streaming(true)
            .build(llm.clone(), &tools)
            .unwrap();
        let executor = AgentExecutor::new(planner, tools, ExecutorOptions::default())
            .unwrap()
            .with_callbacks(Arc::new(CallbackManager::default()));

        assert_eq!(executor.invoke("go").await.unwrap(), "streamed answer");
    }

    #[test]
    fn test_allowed_tools_mismatch() {
        let llm = FakeLLM::new(Vec::<String>::new());
        let planner_tools = ToolRegistry::new([Calculator::default().into_shared()]).unwrap();
        let planner = AgentPlannerBuilder::new()
            .build(llm, &planner_tools)
            .unwrap();

        let result = AgentExecutor::new(
            planner,
            ToolRegistry::new([Arc::new(BrokenTool) as Arc<dyn Tool>]).unwrap(),
            ExecutorOptions::default(),
        );

        assert!(matches!(result, Err(AgentError::ToolValidation(_))));
    }

    #[test]
    fn test_run_blocking() {
        let llm = Arc::new(FakeLLM::new([ADD, "Final Answer: 4"]));
        let executor = executor(
            &llm,
            qa(),
            vec![Calculator::default().into_shared()],
            ExecutorOptions::default(),
        );

        let output = executor.run_blocking(question("What is 2+2?")).unwrap();

        assert_eq!(output.output(), Some("4"));
        assert_eq!(llm.call_count(), 2);
    }

    #[tokio::test]
    async fn test_memory_feeds_chat_history() {
        let llm = Arc::new(FakeLLM::new([
            "Thought: Do I need to use a tool? No\nAI: Hello!",
            "Thought: Do I need to use a tool? No\nAI: You said hi.",
        ]));
        let memory: Arc<tokio::sync::RwLock<dyn Memory>> = SimpleMemory::new().into();
        let executor = executor(
            &llm,
            Arc::new(ChatAgent::default()),
            vec![],
            ExecutorOptions::default(),
        )
        .with_memory(memory.clone());

        assert_eq!(executor.invoke("hi").await.unwrap(), "Hello!");
        assert_eq!(executor.invoke("what did I say?").await.unwrap(), "You said hi.");

        let calls = llm.calls();
        assert!(calls[0].prompt.contains("Previous conversation history:\n\n\nNew input: hi"));
        assert!(calls[1].prompt.contains(indoc! {"
            Previous conversation history:
            Human: hi
            AI: Hello!

            New input: what did I say?"
        }));
        assert_eq!(memory.read().await.messages().len(), 4);
    }

    #[tokio::test]
    async fn test_callbacks_observe_transitions() {
        let llm = Arc::new(FakeLLM::new([ADD, "Final Answer: 4"]));
        let recorder = Arc::new(Recorder::default());
        let executor = executor(
            &llm,
            qa(),
            vec![Calculator::default().into_shared()],
            ExecutorOptions::default(),
        )
        .with_callbacks(Arc::new(CallbackManager::new(vec![recorder.clone()])));

        executor.run(question("What is 2+2?")).await.unwrap();

        assert_eq!(
            recorder.events(),
            vec![
                "action:Calculator",
                "tool_end:Calculator:4",
                "text:Observation: 4\nThought:",
                "finish:4"
            ]
        );
    }
}
