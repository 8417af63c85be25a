use std::{sync::Arc, time::Duration};

use futures::StreamExt;
use uuid::Uuid;

use crate::{
    agent::{AgentBehavior, AgentError, EarlyStoppingMethod},
    callbacks::CallbackManager,
    llm::{CallOptions, LLMError, LLM},
    output_parser::ParsedOutput,
    schemas::{AgentAction, AgentEvent, AgentFinish, AgentStep, TextReplacements},
    template::{PromptTemplate, SCRATCHPAD_VARIABLE},
};

pub const STOPPED_RESPONSE: &str = "Agent stopped due to max iterations.";

const FINAL_ANSWER_NUDGE: &str =
    "\n\nI now need to return a final answer based on the previous steps:";

/// Callback target for one executor run.
#[derive(Clone, Copy)]
pub(crate) struct PlanTrace<'a> {
    pub run_id: Uuid,
    pub callbacks: &'a CallbackManager,
    pub verbose: bool,
}

/// Decides the next action from the steps taken so far.
///
/// Planning holds no state between calls: the scratchpad is rebuilt from the steps on
/// every call, so one planner can serve any number of concurrent runs.
pub struct AgentPlanner {
    pub(super) llm: Arc<dyn LLM>,
    pub(super) behavior: Arc<dyn AgentBehavior>,
    pub(super) prompt: PromptTemplate,
    pub(super) allowed_tools: Option<Vec<String>>,
    pub(super) return_values: Vec<String>,
    pub(super) max_fix_attempts: usize,
    pub(super) request_timeout: Option<Duration>,
    pub(super) streaming: bool,
    pub(super) call_options: CallOptions,
}

impl AgentPlanner {
    pub fn behavior(&self) -> &dyn AgentBehavior {
        self.behavior.as_ref()
    }

    pub fn prompt(&self) -> &PromptTemplate {
        &self.prompt
    }

    /// Tool names the prompt was built for. `None` skips the check at executor
    /// construction.
    pub fn allowed_tools(&self) -> Option<&[String]> {
        self.allowed_tools.as_deref()
    }

    pub fn return_values(&self) -> &[String] {
        &self.return_values
    }

    /// Key of the primary return value.
    pub fn output_key(&self) -> &str {
        self.return_values
            .first()
            .map(String::as_str)
            .unwrap_or(crate::schemas::DEFAULT_OUTPUT_KEY)
    }

    /// Prompt variables the caller must supply.
    pub fn input_keys(&self) -> Vec<String> {
        self.prompt
            .input_variables()
            .iter()
            .filter(|v| v.as_str() != SCRATCHPAD_VARIABLE)
            .cloned()
            .collect()
    }

    pub fn stop_words(&self) -> Vec<String> {
        self.behavior.stop_words()
    }

    pub fn construct_scratchpad(&self, steps: &[AgentStep]) -> String {
        self.behavior.construct_scratchpad(steps)
    }

    /// Plans the next step given everything done so far in this run.
    pub async fn plan(
        &self,
        steps: &[AgentStep],
        inputs: &TextReplacements,
    ) -> Result<AgentEvent, AgentError> {
        self.plan_traced(steps, inputs, None).await
    }

    pub(crate) async fn plan_traced(
        &self,
        steps: &[AgentStep],
        inputs: &TextReplacements,
        trace: Option<PlanTrace<'_>>,
    ) -> Result<AgentEvent, AgentError> {
        let scratchpad = self.construct_scratchpad(steps);
        let (parsed, log) = self.next_action(inputs, &scratchpad, trace).await?;

        let event: AgentEvent = match parsed {
            ParsedOutput::Finish(answer) => self.finish(answer, log).into(),
            ParsedOutput::Action { tool, tool_input } if tool == self.behavior.finish_tool_name() => {
                self.finish(tool_input, log).into()
            }
            ParsedOutput::Action { tool, tool_input } => {
                AgentAction::new(tool, tool_input, log).into()
            }
        };
        Ok(event)
    }

    async fn next_action(
        &self,
        inputs: &TextReplacements,
        base_scratchpad: &str,
        trace: Option<PlanTrace<'_>>,
    ) -> Result<(ParsedOutput, String), AgentError> {
        let mut full_output = self.predict(inputs, base_scratchpad, trace).await?;
        let mut attempts = 0;

        loop {
            let error = match self.behavior.extract_action(&full_output) {
                Ok(parsed) => return Ok((parsed, full_output)),
                Err(e) => e,
            };

            let Some(fixed) = self.behavior.fix_text(&full_output) else {
                return Err(error.into());
            };
            if attempts >= self.max_fix_attempts {
                return Err(AgentError::TooManyFixAttempts(attempts));
            }
            attempts += 1;
            log::warn!(
                "{error}; retrying with fix-up ({attempts}/{})",
                self.max_fix_attempts
            );

            let scratchpad = format!("{base_scratchpad}{fixed}");
            let output = self.predict(inputs, &scratchpad, trace).await?;
            full_output = fixed + &output;
        }
    }

    /// The finish returned when the run hits its iteration cap.
    pub async fn return_stopped_response(
        &self,
        method: EarlyStoppingMethod,
        steps: &[AgentStep],
        inputs: &TextReplacements,
    ) -> Result<AgentFinish, AgentError> {
        self.return_stopped_response_traced(method, steps, inputs, None)
            .await
    }

    pub(crate) async fn return_stopped_response_traced(
        &self,
        method: EarlyStoppingMethod,
        steps: &[AgentStep],
        inputs: &TextReplacements,
        trace: Option<PlanTrace<'_>>,
    ) -> Result<AgentFinish, AgentError> {
        match method {
            EarlyStoppingMethod::Force => Ok(self.finish(STOPPED_RESPONSE, "")),
            EarlyStoppingMethod::Generate => {
                let scratchpad = self.construct_scratchpad(steps) + FINAL_ANSWER_NUDGE;
                let full_output = self.predict(inputs, &scratchpad, trace).await?;

                let answer = match self.behavior.extract_action(&full_output) {
                    Ok(ParsedOutput::Finish(answer)) => answer,
                    Ok(ParsedOutput::Action { tool, tool_input })
                        if tool == self.behavior.finish_tool_name() =>
                    {
                        tool_input
                    }
                    _ => full_output.clone(),
                };
                Ok(self.finish(answer, full_output))
            }
        }
    }

    fn finish(&self, output: impl Into<String>, log: impl Into<String>) -> AgentFinish {
        AgentFinish::with_output(self.output_key(), output, log)
    }

    async fn predict(
        &self,
        inputs: &TextReplacements,
        scratchpad: &str,
        trace: Option<PlanTrace<'_>>,
    ) -> Result<String, AgentError> {
        let mut values = inputs.clone();
        values.insert(SCRATCHPAD_VARIABLE.to_string(), scratchpad.to_string());
        let prompt = self.prompt.format(&values)?;
        let mut stop_words = self.call_options.stop_words.clone().unwrap_or_default();
        for word in self.stop_words() {
            if !stop_words.contains(&word) {
                stop_words.push(word);
            }
        }
        let options = self
            .call_options
            .merged_with(&CallOptions::new().with_stop_words(stop_words));

        log::debug!("\nPrompt:\n{prompt}");
        if let Some(t) = trace {
            t.callbacks.on_llm_start(t.run_id, &prompt, t.verbose);
        }

        match self.complete(&prompt, &options, trace).await {
            Ok(output) => {
                log::debug!("\nCompletion:\n{output}");
                if let Some(t) = trace {
                    t.callbacks.on_llm_end(t.run_id, &output, t.verbose);
                }
                Ok(output)
            }
            Err(e) => {
                if let Some(t) = trace {
                    t.callbacks.on_llm_error(t.run_id, &e, t.verbose);
                }
                Err(e.into())
            }
        }
    }

    async fn complete(
        &self,
        prompt: &str,
        options: &CallOptions,
        trace: Option<PlanTrace<'_>>,
    ) -> Result<String, LLMError> {
        let call = async {
            if !self.streaming {
                return self.llm.generate(prompt, options).await;
            }

            let mut stream = self.llm.stream(prompt, options).await?;
            let mut output = String::new();
            while let Some(chunk) = stream.next().await {
                let chunk = chunk?;
                if let Some(t) = trace {
                    t.callbacks.on_llm_new_token(t.run_id, &chunk, t.verbose);
                }
                output.push_str(&chunk);
            }
            Ok::<_, LLMError>(output)
        };

        match self.request_timeout {
            Some(limit) => tokio::time::timeout(limit, call)
                .await
                .map_err(|_| LLMError::Timeout(limit))?,
            None => call.await,
        }
    }
}

impl std::fmt::Debug for AgentPlanner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentPlanner")
            .field("behavior", &self.behavior)
            .field("allowed_tools", &self.allowed_tools)
            .field("return_values", &self.return_values)
            .field("max_fix_attempts", &self.max_fix_attempts)
            .field("request_timeout", &self.request_timeout)
            .field("streaming", &self.streaming)
            .finish()
    }
}
