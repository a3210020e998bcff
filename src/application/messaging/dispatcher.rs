//! Message dispatcher - Routes chat messages to commands

use crate::application::errors::{BotError, CommandError};
use crate::application::services::{AuditService, CommandService, Invocation};
use crate::domain::entities::Incoming;
use crate::domain::traits::ChatGateway;
use super::parser::CommandParser;

/// Reply sent when a guild-only command is used in a direct message
pub const GUILD_ONLY_REPLY: &str = "Hilda only works in servers!";

/// What happened to a message handed to the dispatcher
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    /// Not a command, or sent by a bot
    Ignored,
    UnknownCommand(String),
    /// Refused before anything ran (bad arguments, wrong place)
    Rejected(String),
    Completed(String),
    Failed(String),
}

/// Message dispatcher - parses, checks, runs the before-invoke hook, then the command
pub struct Dispatcher {
    parser: CommandParser,
    commands: CommandService,
    audit: AuditService,
}

impl Dispatcher {
    pub fn new(parser: CommandParser, commands: CommandService, audit: AuditService) -> Self {
        Self {
            parser,
            commands,
            audit,
        }
    }

    pub fn parser(&self) -> &CommandParser {
        &self.parser
    }

    /// Process a message through the dispatcher
    pub async fn dispatch(&self, gateway: &dyn ChatGateway, incoming: Incoming) -> Dispatch {
        if incoming.author_is_bot {
            return Dispatch::Ignored;
        }
        let Some(parsed) = self.parser.parse(&incoming.content) else {
            return Dispatch::Ignored;
        };
        let Some(command) = self.commands.find(&parsed.name) else {
            tracing::warn!("Command \"{}\" is not found", parsed.name);
            return Dispatch::UnknownCommand(parsed.name);
        };
        let name = command.name.clone();

        let invocation = match self.commands.prepare(gateway, command, &incoming, parsed.args).await {
            Ok(invocation) => invocation,
            Err(e) => {
                tracing::error!("Exception {} was raised from {}", e, name);
                self.report(gateway, incoming.channel_id, &e).await;
                return Dispatch::Rejected(name);
            }
        };

        self.before_invoke(gateway, &invocation).await;

        match self.commands.execute(gateway, &invocation).await {
            Ok(()) => Dispatch::Completed(name),
            Err(e) => {
                tracing::error!("Exception {} was raised from {}", e, name);
                self.report(gateway, invocation.channel_id, &e).await;
                Dispatch::Failed(name)
            }
        }
    }

    /// Remove the invoking message so the channel only keeps what the command
    /// produced, then write the audit entry
    async fn before_invoke(&self, gateway: &dyn ChatGateway, invocation: &Invocation) {
        if let Err(e) = gateway.delete_message(invocation.channel_id, invocation.message_id).await {
            tracing::warn!("Could not delete invoking message for {}: {}", invocation.command, e);
        }
        if let Err(e) = self.audit.record(gateway, invocation).await {
            tracing::warn!("Could not write audit entry for {}: {}", invocation.command, e);
        }
    }

    async fn report(&self, gateway: &dyn ChatGateway, channel_id: u64, error: &BotError) {
        let text = match error {
            BotError::Command(CommandError::GuildOnly) => GUILD_ONLY_REPLY.to_string(),
            BotError::Command(e) => e.to_string(),
            _ => "Something went wrong, see the bot logs.".to_string(),
        };
        if let Err(e) = gateway.send(channel_id, &text).await {
            tracing::warn!("Could not report error: {}", e);
        }
    }
}
