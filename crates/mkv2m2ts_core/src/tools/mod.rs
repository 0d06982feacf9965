//! External toolchain: executable lookup and process execution.

mod locator;
mod runner;

pub use locator::{Tool, Toolchain};
pub use runner::{CommandRunner, Invocation, PipedOutput, SystemRunner, ToolOutput};
