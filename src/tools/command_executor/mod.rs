#[allow(clippy::module_inception)]
mod command_executor;
pub use command_executor::*;
