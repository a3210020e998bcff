//! Positional argument conversion for commands

use std::collections::VecDeque;

use crate::application::errors::CommandError;
use crate::domain::entities::Amount;

/// Remaining argument tokens of an invocation, consumed front to back
#[derive(Debug, Clone, Default)]
pub struct Args {
    tokens: VecDeque<String>,
}

impl Args {
    pub fn new(tokens: Vec<String>) -> Self {
        Self {
            tokens: tokens.into(),
        }
    }

    /// Optional leading count.
    ///
    /// If the next token is an integer it is taken as the amount, otherwise
    /// nothing is consumed and the amount covers the whole channel.
    pub fn amount(&mut self) -> Result<Amount, CommandError> {
        let Some(first) = self.tokens.front() else {
            return Ok(Amount::ALL);
        };
        match first.parse::<i64>() {
            Ok(n) if n < 0 => Err(CommandError::InvalidArgs(format!(
                "amount must not be negative, got {}",
                n
            ))),
            Ok(n) => {
                self.tokens.pop_front();
                Ok(Amount(Some(n as usize)))
            }
            Err(_) => Ok(Amount::ALL),
        }
    }

    /// Next token, required
    pub fn word(&mut self, what: &str) -> Result<String, CommandError> {
        self.tokens
            .pop_front()
            .ok_or_else(|| CommandError::MissingArg(what.to_string()))
    }

    pub fn peek(&self) -> Option<&str> {
        self.tokens.front().map(String::as_str)
    }

    pub fn next(&mut self) -> Option<String> {
        self.tokens.pop_front()
    }
}
