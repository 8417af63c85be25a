#[allow(clippy::module_inception)]
mod output_parser;
pub use output_parser::*;

mod error;
pub use error::*;

mod react_parser;
pub use react_parser::*;
