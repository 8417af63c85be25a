mod handler;
pub use handler::*;

mod manager;
pub use manager::*;

mod logging_handler;
pub use logging_handler::*;
