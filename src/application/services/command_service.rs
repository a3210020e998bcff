use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::application::errors::{BotError, CommandError};
use crate::application::formatting::{MessageFormatter, Sheet};
use crate::application::messaging::parser::is_user_mention;
use crate::application::messaging::Args;
use crate::application::services::message_service::Removal;
use crate::application::services::MessageService;
use crate::domain::entities::{Amount, Author, ChannelRef, Command, CommandRegistry, Incoming};
use crate::domain::traits::ChatGateway;

/// Settings the commands depend on
#[derive(Debug, Clone)]
pub struct CommandSettings {
    pub prefix: String,
    pub running_locally: bool,
    pub confirm_timeout: Duration,
    pub backup_dir: PathBuf,
}

impl Default for CommandSettings {
    fn default() -> Self {
        Self {
            prefix: "!".to_string(),
            running_locally: false,
            confirm_timeout: Duration::from_secs(10),
            backup_dir: PathBuf::from("."),
        }
    }
}

/// A command with its arguments converted
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    Bobbin { amount: Amount, name: String },
    Pin { amount: Amount },
    Copy { amount: Amount, target: ChannelRef },
    Move { amount: Amount, target: ChannelRef },
    Save { amount: Amount },
    Remove { amount: Amount, members: Vec<Author> },
    Help { command: Option<String> },
}

impl Operation {
    pub fn amount(&self) -> Amount {
        match self {
            Operation::Bobbin { amount, .. }
            | Operation::Pin { amount }
            | Operation::Copy { amount, .. }
            | Operation::Move { amount, .. }
            | Operation::Save { amount }
            | Operation::Remove { amount, .. } => *amount,
            Operation::Help { .. } => Amount::ALL,
        }
    }

    /// Where messages end up, for commands that move or copy them
    pub fn destination(&self) -> Option<String> {
        match self {
            Operation::Bobbin { name, .. } => Some(name.clone()),
            Operation::Copy { target, .. } | Operation::Move { target, .. } => Some(target.to_string()),
            _ => None,
        }
    }

    /// Members a removal is restricted to, or `everyone`
    pub fn members_text(&self) -> String {
        match self {
            Operation::Remove { members, .. } if !members.is_empty() => members
                .iter()
                .map(Author::mention)
                .collect::<Vec<_>>()
                .join(", "),
            _ => "everyone".to_string(),
        }
    }
}

/// One command invocation, ready to run
#[derive(Debug, Clone)]
pub struct Invocation {
    pub command: String,
    pub message_id: u64,
    pub author: Author,
    pub channel_id: u64,
    pub channel: Option<ChannelRef>,
    pub operation: Operation,
}

/// Service for converting and executing commands
pub struct CommandService {
    registry: CommandRegistry,
    settings: CommandSettings,
    messages: MessageService,
}

impl CommandService {
    pub fn new(settings: CommandSettings, sheet: Arc<Sheet>) -> Self {
        let mut service = Self {
            registry: CommandRegistry::new(),
            settings,
            messages: MessageService::new(MessageFormatter::new(sheet)),
        };
        service.register_defaults();
        service
    }

    pub fn register(&mut self, command: Command) {
        self.registry.register(command);
    }

    pub fn register_defaults(&mut self) {
        self.register(Command::new("help")
            .with_description("Show help message")
            .with_usage("help [command]"));

        self.register(Command::new("bobbin")
            .with_description("Create a thread and move the last messages into it")
            .with_usage("bobbin [amt] <name>")
            .guild_only());

        self.register(Command::new("pin")
            .with_description("Pin the last messages")
            .with_usage("pin [amt]")
            .guild_only());

        self.register(Command::new("cp")
            .with_description("Copy the last messages to a channel, here or in another server")
            .with_usage("cp [amt] <channel | Server@Channel>")
            .guild_only());

        self.register(Command::new("mv")
            .with_description("Move the last messages to a channel, here or in another server")
            .with_usage("mv [amt] <channel | Server@Channel>")
            .guild_only());

        self.register(Command::new("save")
            .with_description("Save the last messages to a file (local runs only)")
            .with_usage("save [amt]")
            .guild_only());

        self.register(Command::new("rm")
            .with_description("Delete the last messages, optionally only from some members")
            .with_usage("rm [amt] [members...]")
            .with_aliases(vec!["purge".to_string()])
            .guild_only());
    }

    pub fn find(&self, name: &str) -> Option<&Command> {
        self.registry.find(name)
    }

    /// Convert raw arguments for `command`. Fails before anything is changed in the guild.
    pub async fn prepare(
        &self,
        gateway: &dyn ChatGateway,
        command: &Command,
        incoming: &Incoming,
        args: Vec<String>,
    ) -> Result<Invocation, BotError> {
        if command.guild_only && incoming.channel.is_none() {
            return Err(CommandError::GuildOnly.into());
        }

        let mut args = Args::new(args);
        let operation = match command.name.as_str() {
            "help" => Operation::Help { command: args.next() },
            "bobbin" => {
                let amount = args.amount()?;
                let name = args.word("name")?;
                if name.trim().is_empty() {
                    return Err(CommandError::InvalidArgs("thread name must not be empty".to_string()).into());
                }
                Operation::Bobbin { amount, name }
            }
            "pin" => Operation::Pin { amount: args.amount()? },
            "cp" | "mv" => {
                let amount = args.amount()?;
                let token = args.word("channel")?;
                let target = self.resolve_target(gateway, incoming, &token).await?;
                if command.name == "cp" {
                    Operation::Copy { amount, target }
                } else {
                    Operation::Move { amount, target }
                }
            }
            "save" => {
                if !self.settings.running_locally {
                    return Err(CommandError::Disabled("save only works when running locally".to_string()).into());
                }
                Operation::Save { amount: args.amount()? }
            }
            "rm" => {
                let amount = args.amount()?;
                let members = self.resolve_members(gateway, incoming, &mut args).await?;
                Operation::Remove { amount, members }
            }
            other => return Err(CommandError::NotFound(other.to_string()).into()),
        };

        Ok(Invocation {
            command: command.name.clone(),
            message_id: incoming.id,
            author: incoming.author.clone(),
            channel_id: incoming.channel_id,
            channel: incoming.channel.clone(),
            operation,
        })
    }

    /// Run a prepared invocation
    pub async fn execute(&self, gateway: &dyn ChatGateway, invocation: &Invocation) -> Result<(), BotError> {
        if let Operation::Help { command } = &invocation.operation {
            let text = self.get_help(command.as_deref());
            gateway.send(invocation.channel_id, &text).await?;
            return Ok(());
        }

        let channel = invocation.channel.as_ref().ok_or(CommandError::GuildOnly)?;
        match &invocation.operation {
            Operation::Bobbin { amount, name } => {
                let n = self.messages.bobbin(gateway, channel, *amount, name).await?;
                tracing::info!("bobbin: moved {} messages from {} to thread {}", n, channel, name);
            }
            Operation::Pin { amount } => {
                let n = self.messages.pin(gateway, channel, *amount).await?;
                tracing::info!("pin: pinned {} messages in {}", n, channel);
            }
            Operation::Copy { amount, target } => {
                let n = self.messages.copy(gateway, channel, *amount, target).await?;
                tracing::info!("cp: copied {} messages from {} to {}", n, channel, target);
            }
            Operation::Move { amount, target } => {
                let n = self.messages.relocate(gateway, channel, *amount, target).await?;
                tracing::info!("mv: moved {} messages from {} to {}", n, channel, target);
            }
            Operation::Save { amount } => {
                let path = self
                    .messages
                    .save(gateway, channel, *amount, &self.settings.backup_dir)
                    .await?;
                tracing::info!("save: wrote {}", path.display());
            }
            Operation::Remove { amount, members } => {
                match self
                    .messages
                    .remove(gateway, channel, *amount, members, self.settings.confirm_timeout)
                    .await?
                {
                    Removal::Removed(n) => tracing::info!("rm: removed {} messages from {}", n, channel),
                    Removal::TimedOut => tracing::info!("rm: confirmation timed out in {}", channel),
                }
            }
            Operation::Help { .. } => {}
        }
        Ok(())
    }

    pub fn get_help(&self, command: Option<&str>) -> String {
        let prefix = &self.settings.prefix;
        if let Some(name) = command {
            if let Some(cmd) = self.registry.find(name) {
                let mut help = format!("{}{} - {}", prefix, cmd.name, cmd.description.as_deref().unwrap_or("No description"));
                if let Some(usage) = &cmd.usage {
                    help.push_str(&format!("\nUsage: {}{}", prefix, usage));
                }
                if !cmd.aliases.is_empty() {
                    help.push_str(&format!("\nAliases: {}", cmd.aliases.join(", ")));
                }
                return help;
            }
            return format!("Command {}{} not found", prefix, name);
        }

        let mut help = "Available commands:\n".to_string();
        for cmd in self.registry.all() {
            help.push_str(&format!("  {}{} - {}\n", prefix, cmd.name, cmd.description.as_deref().unwrap_or("")));
        }
        help
    }

    /// A channel of the current guild, or `Server@Channel` for another guild the bot is in
    async fn resolve_target(
        &self,
        gateway: &dyn ChatGateway,
        incoming: &Incoming,
        token: &str,
    ) -> Result<ChannelRef, BotError> {
        let guild = incoming.guild().ok_or(CommandError::GuildOnly)?;
        if let Some(channel) = gateway.resolve_channel(guild, token).await? {
            return Ok(channel);
        }

        let not_found = || CommandError::InvalidArgs(format!("Channel \"{}\" not found", token));
        let (guild_name, channel_name) = token.split_once('@').ok_or_else(not_found)?;
        let other = gateway
            .find_guild(guild_name)
            .await?
            .ok_or_else(|| CommandError::InvalidArgs(format!("Server \"{}\" not found", guild_name)))?;
        let channel_name = channel_name.split('@').next().unwrap_or_default();

        Ok(gateway
            .find_channel(&other, channel_name)
            .await?
            .ok_or_else(not_found)?)
    }

    /// Take members greedily until a token does not name one.
    /// A mention that does not resolve is an error rather than the end of the list.
    async fn resolve_members(
        &self,
        gateway: &dyn ChatGateway,
        incoming: &Incoming,
        args: &mut Args,
    ) -> Result<Vec<Author>, BotError> {
        let guild = incoming.guild().ok_or(CommandError::GuildOnly)?;
        let mut members = Vec::new();
        while let Some(token) = args.peek() {
            match gateway.resolve_member(guild, token).await? {
                Some(member) => {
                    members.push(member);
                    args.next();
                }
                None if is_user_mention(token) => {
                    return Err(CommandError::InvalidArgs(format!("Member {} not found", token)).into());
                }
                None => break,
            }
        }
        Ok(members)
    }
}
