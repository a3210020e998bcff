//! Application layer errors

use thiserror::Error;

/// General bot errors
#[derive(Error, Debug)]
pub enum BotError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Discord error: {0}")]
    Discord(String),

    #[error("Sheet error: {0}")]
    Sheet(#[from] SheetError),

    #[error("Command error: {0}")]
    Command(#[from] CommandError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Command execution errors
#[derive(Error, Debug)]
pub enum CommandError {
    #[error("Command not found: {0}")]
    NotFound(String),

    #[error("Invalid arguments: {0}")]
    InvalidArgs(String),

    #[error("Missing argument: {0}")]
    MissingArg(String),

    #[error("This command only works in servers")]
    GuildOnly,

    #[error("Command disabled: {0}")]
    Disabled(String),
}

/// Format sheet errors
#[derive(Error, Debug, PartialEq, Eq)]
pub enum SheetError {
    #[error("No section named '{0}'")]
    MissingSection(String),

    #[error("Unknown placeholder '{0}'")]
    UnknownPlaceholder(String),

    #[error("Unbalanced brace at byte {0}")]
    UnbalancedBrace(usize),
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value: {0}")]
    InvalidValue(String),

    #[error("Parse error: {0}")]
    Parse(String),
}
