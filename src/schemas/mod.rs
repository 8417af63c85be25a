mod message_type;
pub use message_type::*;

pub mod messages;
pub use messages::*;

mod agent_plan;
pub use agent_plan::*;

mod text_replacements;
pub use text_replacements::*;
