#[allow(clippy::module_inception)]
mod llm;
pub use llm::*;

mod error;
pub use error::*;

pub mod options;
pub use options::*;

mod fake;
pub use fake::*;

pub mod openai;
pub use openai::*;
