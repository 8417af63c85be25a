mod error;
pub use error::*;

mod behavior;
pub use behavior::*;

mod agent_type;
pub use agent_type::*;

mod qa;
pub use qa::*;

mod chat;
pub use chat::*;

mod persona;
pub use persona::*;

mod planner;
pub use planner::*;

mod executor;
pub use executor::*;

mod initialize;
pub use initialize::*;
