use std::{collections::HashMap, error::Error};

use uuid::Uuid;

use crate::schemas::{AgentAction, AgentFinish, TextReplacements};

pub type CallbackError = Box<dyn Error + Send + Sync>;
pub type CallbackResult = Result<(), CallbackError>;

/// Observer of agent loop transitions.
///
/// Every method defaults to a no-op. A handler only receives calls marked verbose,
/// unless [`CallbackHandler::always_verbose`] is true. `run_id` identifies one
/// executor run.
#[allow(unused_variables)]
pub trait CallbackHandler: Send + Sync {
    fn always_verbose(&self) -> bool {
        false
    }

    fn ignore_llm(&self) -> bool {
        false
    }

    fn ignore_agent(&self) -> bool {
        false
    }

    fn on_llm_start(&self, run_id: Uuid, prompt: &str) -> CallbackResult {
        Ok(())
    }

    /// Only called when streaming is enabled.
    fn on_llm_new_token(&self, run_id: Uuid, token: &str) -> CallbackResult {
        Ok(())
    }

    fn on_llm_end(&self, run_id: Uuid, output: &str) -> CallbackResult {
        Ok(())
    }

    fn on_llm_error(&self, run_id: Uuid, error: &(dyn Error + Send + Sync)) -> CallbackResult {
        Ok(())
    }

    fn on_chain_start(&self, run_id: Uuid, inputs: &TextReplacements) -> CallbackResult {
        Ok(())
    }

    fn on_chain_end(&self, run_id: Uuid, outputs: &HashMap<String, String>) -> CallbackResult {
        Ok(())
    }

    fn on_chain_error(&self, run_id: Uuid, error: &(dyn Error + Send + Sync)) -> CallbackResult {
        Ok(())
    }

    fn on_tool_start(&self, run_id: Uuid, tool: &str, input: &str) -> CallbackResult {
        Ok(())
    }

    fn on_tool_end(&self, run_id: Uuid, tool: &str, output: &str) -> CallbackResult {
        Ok(())
    }

    fn on_tool_error(
        &self,
        run_id: Uuid,
        tool: &str,
        error: &(dyn Error + Send + Sync),
    ) -> CallbackResult {
        Ok(())
    }

    fn on_text(&self, run_id: Uuid, text: &str) -> CallbackResult {
        Ok(())
    }

    fn on_agent_action(&self, run_id: Uuid, action: &AgentAction) -> CallbackResult {
        Ok(())
    }

    fn on_agent_finish(&self, run_id: Uuid, finish: &AgentFinish) -> CallbackResult {
        Ok(())
    }
}
