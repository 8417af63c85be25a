#[allow(clippy::module_inception)]
mod planner;
pub use planner::*;

mod builder;
pub use builder::*;
