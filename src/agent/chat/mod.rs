mod agent;
pub use agent::*;

pub mod prompt;
