use std::{
    collections::HashMap,
    error::Error,
    panic::{catch_unwind, AssertUnwindSafe},
    sync::{Arc, Mutex, MutexGuard, OnceLock},
};

use uuid::Uuid;

use crate::schemas::{AgentAction, AgentFinish, TextReplacements};

use super::{CallbackHandler, CallbackResult};

type SharedHandler = Arc<dyn CallbackHandler>;

#[derive(Clone, Copy, PartialEq, Eq)]
enum EventKind {
    Llm,
    Agent,
    Chain,
}

/// Fans events out to registered handlers.
///
/// Handler failures, including panics, are logged and never reach the loop. The
/// lock is held while notifying, so a handler must not call back into the manager
/// that is notifying it.
#[derive(Default)]
pub struct CallbackManager {
    handlers: Mutex<Vec<SharedHandler>>,
}

static GLOBAL: OnceLock<CallbackManager> = OnceLock::new();

impl CallbackManager {
    pub fn new(handlers: Vec<SharedHandler>) -> Self {
        Self {
            handlers: Mutex::new(handlers),
        }
    }

    /// Process wide manager, created empty on first use.
    pub fn global() -> &'static CallbackManager {
        GLOBAL.get_or_init(CallbackManager::default)
    }

    fn handlers(&self) -> MutexGuard<'_, Vec<SharedHandler>> {
        self.handlers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn add_handler(&self, handler: SharedHandler) {
        self.handlers().push(handler);
    }

    pub fn remove_handler(&self, handler: &SharedHandler) {
        self.handlers().retain(|h| !Arc::ptr_eq(h, handler));
    }

    pub fn set_handlers(&self, handlers: Vec<SharedHandler>) {
        *self.handlers() = handlers;
    }

    pub fn set_handler(&self, handler: SharedHandler) {
        self.set_handlers(vec![handler]);
    }

    pub fn len(&self) -> usize {
        self.handlers().len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers().is_empty()
    }

    fn notify<F>(&self, event: &str, kind: EventKind, verbose: bool, call: F)
    where
        F: Fn(&dyn CallbackHandler) -> CallbackResult,
    {
        let handlers = self.handlers();
        for handler in handlers.iter() {
            let ignored = match kind {
                EventKind::Llm => handler.ignore_llm(),
                EventKind::Agent => handler.ignore_agent(),
                EventKind::Chain => false,
            };
            if ignored || !(verbose || handler.always_verbose()) {
                continue;
            }
            match catch_unwind(AssertUnwindSafe(|| call(handler.as_ref()))) {
                Ok(Ok(())) => {}
                Ok(Err(e)) => log::warn!("Callback handler failed on {event}: {e}"),
                Err(_) => log::warn!("Callback handler panicked on {event}"),
            }
        }
    }

    pub fn on_llm_start(&self, run_id: Uuid, prompt: &str, verbose: bool) {
        self.notify("llm_start", EventKind::Llm, verbose, |h| {
            h.on_llm_start(run_id, prompt)
        });
    }

    pub fn on_llm_new_token(&self, run_id: Uuid, token: &str, verbose: bool) {
        self.notify("llm_new_token", EventKind::Llm, verbose, |h| {
            h.on_llm_new_token(run_id, token)
        });
    }

    pub fn on_llm_end(&self, run_id: Uuid, output: &str, verbose: bool) {
        self.notify("llm_end", EventKind::Llm, verbose, |h| {
            h.on_llm_end(run_id, output)
        });
    }

    pub fn on_llm_error(&self, run_id: Uuid, error: &(dyn Error + Send + Sync), verbose: bool) {
        self.notify("llm_error", EventKind::Llm, verbose, |h| {
            h.on_llm_error(run_id, error)
        });
    }

    pub fn on_chain_start(&self, run_id: Uuid, inputs: &TextReplacements, verbose: bool) {
        self.notify("chain_start", EventKind::Chain, verbose, |h| {
            h.on_chain_start(run_id, inputs)
        });
    }

    pub fn on_chain_end(&self, run_id: Uuid, outputs: &HashMap<String, String>, verbose: bool) {
        self.notify("chain_end", EventKind::Chain, verbose, |h| {
            h.on_chain_end(run_id, outputs)
        });
    }

    pub fn on_chain_error(&self, run_id: Uuid, error: &(dyn Error + Send + Sync), verbose: bool) {
        self.notify("chain_error", EventKind::Chain, verbose, |h| {
            h.on_chain_error(run_id, error)
        });
    }

    pub fn on_tool_start(&self, run_id: Uuid, tool: &str, input: &str, verbose: bool) {
        self.notify("tool_start", EventKind::Agent, verbose, |h| {
            h.on_tool_start(run_id, tool, input)
        });
    }

    pub fn on_tool_end(&self, run_id: Uuid, tool: &str, output: &str, verbose: bool) {
        self.notify("tool_end", EventKind::Agent, verbose, |h| {
            h.on_tool_end(run_id, tool, output)
        });
    }

    pub fn on_tool_error(
        &self,
        run_id: Uuid,
        tool: &str,
        error: &(dyn Error + Send + Sync),
        verbose: bool,
    ) {
        self.notify("tool_error", EventKind::Agent, verbose, |h| {
            h.on_tool_error(run_id, tool, error)
        });
    }

    pub fn on_text(&self, run_id: Uuid, text: &str, verbose: bool) {
        self.notify("text", EventKind::Chain, verbose, |h| h.on_text(run_id, text));
    }

    pub fn on_agent_action(&self, run_id: Uuid, action: &AgentAction, verbose: bool) {
        self.notify("agent_action", EventKind::Agent, verbose, |h| {
            h.on_agent_action(run_id, action)
        });
    }

    pub fn on_agent_finish(&self, run_id: Uuid, finish: &AgentFinish, verbose: bool) {
        self.notify("agent_finish", EventKind::Agent, verbose, |h| {
            h.on_agent_finish(run_id, finish)
        });
    }
}

impl std::fmt::Debug for CallbackManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallbackManager")
            .field("handlers", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[derive(Default)]
    struct Counting {
        actions: AtomicUsize,
        llm_starts: AtomicUsize,
        verbose: bool,
        ignore_llm: bool,
    }

    impl CallbackHandler for Counting {
        fn always_verbose(&self) -> bool {
            self.verbose
        }

        fn ignore_llm(&self) -> bool {
            self.ignore_llm
        }

        fn on_llm_start(&self, _run_id: Uuid, _prompt: &str) -> CallbackResult {
            self.llm_starts.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn on_agent_action(&self, _run_id: Uuid, _action: &AgentAction) -> CallbackResult {
            self.actions.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct Failing;

    impl CallbackHandler for Failing {
        fn always_verbose(&self) -> bool {
            true
        }

        fn on_agent_action(&self, _run_id: Uuid, _action: &AgentAction) -> CallbackResult {
            Err("handler broke".into())
        }
    }

    struct Panicking;

    impl CallbackHandler for Panicking {
        fn always_verbose(&self) -> bool {
            true
        }

        fn on_agent_action(&self, _run_id: Uuid, _action: &AgentAction) -> CallbackResult {
            panic!("handler panicked")
        }
    }

    fn action() -> AgentAction {
        AgentAction::new("Search", "weather", "Action: Search\nAction Input: weather")
    }

    #[test]
    fn test_verbose_gate() {
        let quiet = Arc::new(Counting::default());
        let loud = Arc::new(Counting {
            verbose: true,
            ..Default::default()
        });
        let manager = CallbackManager::new(vec![quiet.clone(), loud.clone()]);

        manager.on_agent_action(Uuid::new_v4(), &action(), false);
        assert_eq!(quiet.actions.load(Ordering::SeqCst), 0);
        assert_eq!(loud.actions.load(Ordering::SeqCst), 1);

        manager.on_agent_action(Uuid::new_v4(), &action(), true);
        assert_eq!(quiet.actions.load(Ordering::SeqCst), 1);
        assert_eq!(loud.actions.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_ignore_llm() {
        let handler = Arc::new(Counting {
            verbose: true,
            ignore_llm: true,
            ..Default::default()
        });
        let manager = CallbackManager::new(vec![handler.clone()]);

        manager.on_llm_start(Uuid::new_v4(), "prompt", true);
        manager.on_agent_action(Uuid::new_v4(), &action(), true);

        assert_eq!(handler.llm_starts.load(Ordering::SeqCst), 0);
        assert_eq!(handler.actions.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_failing_handlers_are_isolated() {
        let counting = Arc::new(Counting {
            verbose: true,
            ..Default::default()
        });
        let manager =
            CallbackManager::new(vec![Arc::new(Failing), Arc::new(Panicking), counting.clone()]);

        manager.on_agent_action(Uuid::new_v4(), &action(), true);
        manager.on_agent_action(Uuid::new_v4(), &action(), true);

        assert_eq!(counting.actions.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_add_and_remove_handler() {
        let manager = CallbackManager::default();
        let handler: SharedHandler = Arc::new(Counting::default());

        manager.add_handler(handler.clone());
        manager.add_handler(Arc::new(Failing));
        assert_eq!(manager.len(), 2);

        manager.remove_handler(&handler);
        assert_eq!(manager.len(), 1);

        manager.set_handler(handler);
        assert_eq!(manager.len(), 1);
    }

    #[test]
    fn test_global_is_shared() {
        let a = CallbackManager::global() as *const CallbackManager;
        let b = CallbackManager::global() as *const CallbackManager;
        assert_eq!(a, b);
    }
}
