mod agent_action;
pub use agent_action::*;

mod agent_finish;
pub use agent_finish::*;

mod agent_step;
pub use agent_step::*;

mod agent_event;
pub use agent_event::*;
