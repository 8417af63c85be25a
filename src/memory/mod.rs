#[allow(clippy::module_inception)]
mod memory;
pub use memory::*;

mod simple_memory;
pub use simple_memory::*;

mod window_buffer;
pub use window_buffer::*;

mod token_buffer;
pub use token_buffer::*;

mod error;
pub use error::*;
