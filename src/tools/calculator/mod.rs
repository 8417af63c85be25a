#[allow(clippy::module_inception)]
mod calculator;
pub use calculator::*;
