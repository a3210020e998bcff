//! Command parser - recognises prefixes and splits arguments

use once_cell::sync::{Lazy, OnceCell};
use regex_lite::Regex;

static USER_MENTION: Lazy<Regex> = Lazy::new(|| Regex::new(r"^<@!?([0-9]+)>$").unwrap());
static CHANNEL_MENTION: Lazy<Regex> = Lazy::new(|| Regex::new(r"^<#([0-9]+)>$").unwrap());
static RAW_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"^([0-9]{15,20})$").unwrap());

/// A command name and its raw argument tokens
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommand {
    pub name: String,
    pub args: Vec<String>,
}

/// Recognises `!command` (or a custom prefix) and `@bot command`
#[derive(Debug, Clone)]
pub struct CommandParser {
    command_prefix: String,
    bot_id: OnceCell<u64>,
}

impl CommandParser {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            command_prefix: prefix.into(),
            bot_id: OnceCell::new(),
        }
    }

    /// Also accept a mention of the bot as a prefix
    pub fn with_bot_id(self, bot_id: u64) -> Self {
        self.set_bot_id(bot_id);
        self
    }

    /// Learned once the gateway reports who we are; later calls are ignored
    pub fn set_bot_id(&self, bot_id: u64) {
        let _ = self.bot_id.set(bot_id);
    }

    /// Parse a message. Returns `None` when it is not addressed to the bot.
    pub fn parse(&self, text: &str) -> Option<ParsedCommand> {
        let rest = self.strip_prefix(text)?;
        let mut tokens = tokenize(rest).into_iter();
        let name = tokens.next()?.to_lowercase();

        Some(ParsedCommand {
            name,
            args: tokens.collect(),
        })
    }

    fn strip_prefix<'a>(&self, text: &'a str) -> Option<&'a str> {
        if let Some(id) = self.bot_id.get() {
            for mention in [format!("<@{}>", id), format!("<@!{}>", id)] {
                if let Some(rest) = text.strip_prefix(mention.as_str()) {
                    return Some(rest.trim_start());
                }
            }
        }
        if self.command_prefix.is_empty() {
            return None;
        }
        text.strip_prefix(self.command_prefix.as_str())
    }
}

/// Split on whitespace, keeping "double quoted" runs together.
/// A backslash escapes a quote inside a quoted run.
pub fn tokenize(input: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut quoted = false;
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' => {
                in_quotes = !in_quotes;
                quoted = true;
            }
            '\\' if in_quotes && chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            c if c.is_whitespace() && !in_quotes => {
                if !current.is_empty() || quoted {
                    tokens.push(std::mem::take(&mut current));
                }
                quoted = false;
            }
            c => current.push(c),
        }
    }
    if !current.is_empty() || quoted {
        tokens.push(current);
    }
    tokens
}

/// `<@123>` / `<@!123>` or a bare snowflake
pub fn parse_user_ref(token: &str) -> Option<u64> {
    capture_id(&USER_MENTION, token).or_else(|| parse_snowflake(token))
}

/// `<#123>` or a bare snowflake
pub fn parse_channel_ref(token: &str) -> Option<u64> {
    capture_id(&CHANNEL_MENTION, token).or_else(|| parse_snowflake(token))
}

/// Whether `token` is written as a user mention, valid id or not
pub fn is_user_mention(token: &str) -> bool {
    USER_MENTION.is_match(token)
}

/// A bare snowflake only
pub fn parse_snowflake(token: &str) -> Option<u64> {
    capture_id(&RAW_ID, token)
}

/// Discord ids are never zero
fn capture_id(re: &Regex, token: &str) -> Option<u64> {
    re.captures(token)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
        .filter(|&id| id != 0)
}
