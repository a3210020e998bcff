//! Message handling - turning chat messages into command invocations

pub mod args;
pub mod dispatcher;
pub mod parser;

pub use args::Args;
pub use dispatcher::{Dispatch, Dispatcher};
pub use parser::{CommandParser, ParsedCommand};
