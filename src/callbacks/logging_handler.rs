use std::{collections::HashMap, error::Error};

use uuid::Uuid;

use crate::schemas::{AgentAction, AgentFinish, TextReplacements};

use super::{CallbackHandler, CallbackResult};

/// Mirrors loop transitions into the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingCallbackHandler;

impl CallbackHandler for LoggingCallbackHandler {
    fn always_verbose(&self) -> bool {
        true
    }

    fn on_llm_start(&self, run_id: Uuid, prompt: &str) -> CallbackResult {
        log::debug!("[{run_id}] Prompt:\n{prompt}");
        Ok(())
    }

    fn on_llm_end(&self, run_id: Uuid, output: &str) -> CallbackResult {
        log::debug!("[{run_id}] Completion:\n{output}");
        Ok(())
    }

    fn on_llm_error(&self, run_id: Uuid, error: &(dyn Error + Send + Sync)) -> CallbackResult {
        log::warn!("[{run_id}] Completion failed: {error}");
        Ok(())
    }

    fn on_chain_start(&self, run_id: Uuid, inputs: &TextReplacements) -> CallbackResult {
        let mut keys = inputs.keys().map(String::as_str).collect::<Vec<_>>();
        keys.sort_unstable();
        log::info!("[{run_id}] Entering agent run with inputs [{}]", keys.join(", "));
        Ok(())
    }

    fn on_chain_end(&self, run_id: Uuid, _outputs: &HashMap<String, String>) -> CallbackResult {
        log::info!("[{run_id}] Finished agent run");
        Ok(())
    }

    fn on_chain_error(&self, run_id: Uuid, error: &(dyn Error + Send + Sync)) -> CallbackResult {
        log::warn!("[{run_id}] Agent run failed: {error}");
        Ok(())
    }

    fn on_tool_start(&self, run_id: Uuid, tool: &str, input: &str) -> CallbackResult {
        log::info!("[{run_id}] Tool {tool} started with input: {input}");
        Ok(())
    }

    fn on_tool_end(&self, run_id: Uuid, tool: &str, output: &str) -> CallbackResult {
        log::info!("[{run_id}] Tool {tool} returned: {output}");
        Ok(())
    }

    fn on_tool_error(
        &self,
        run_id: Uuid,
        tool: &str,
        error: &(dyn Error + Send + Sync),
    ) -> CallbackResult {
        log::warn!("[{run_id}] Tool {tool} failed: {error}");
        Ok(())
    }

    fn on_text(&self, run_id: Uuid, text: &str) -> CallbackResult {
        log::info!("[{run_id}] {text}");
        Ok(())
    }

    fn on_agent_action(&self, run_id: Uuid, action: &AgentAction) -> CallbackResult {
        log::info!("[{run_id}] Action: {action}");
        Ok(())
    }

    fn on_agent_finish(&self, run_id: Uuid, finish: &AgentFinish) -> CallbackResult {
        log::info!(
            "[{run_id}] Final answer: {}",
            finish.output().unwrap_or(finish.log.as_str())
        );
        Ok(())
    }
}
