mod tool;
pub use tool::*;

mod registry;
pub use registry::*;

mod invalid_tool;
pub use invalid_tool::*;

mod calculator;
pub use calculator::*;

mod command_executor;
pub use command_executor::*;

mod error;
pub use error::*;
