use super::{AgentAction, AgentFinish};

/// Outcome of one planning call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentEvent {
    Action(AgentAction),
    Finish(AgentFinish),
}

impl AgentEvent {
    pub fn is_finish(&self) -> bool {
        matches!(self, AgentEvent::Finish(_))
    }
}

impl From<AgentAction> for AgentEvent {
    fn from(action: AgentAction) -> Self {
        AgentEvent::Action(action)
    }
}

impl From<AgentFinish> for AgentEvent {
    fn from(finish: AgentFinish) -> Self {
        AgentEvent::Finish(finish)
    }
}
