//! The message operations behind each command

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::Utc;

use crate::application::errors::BotError;
use crate::application::formatting::MessageFormatter;
use crate::domain::entities::{chronological, Amount, ArchivedMessage, Author, ChannelRef};
use crate::domain::traits::{ChatGateway, MessageFilter};

/// Reason recorded in the audit log for automatic pins
pub const PIN_REASON: &str = "Pinned automatically by hilda.";

pub const CONFIRM_PROMPT: &str = "React to this message to proceed.";
pub const CONFIRM_TIMEOUT_TEXT: &str = "Timed out. Please try again.";

/// Outcome of `rm`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Removal {
    Removed(usize),
    TimedOut,
}

/// Service for the message-management commands
pub struct MessageService {
    formatter: MessageFormatter,
}

impl MessageService {
    pub fn new(formatter: MessageFormatter) -> Self {
        Self { formatter }
    }

    /// Create a thread named `name` and move the last messages into it
    pub async fn bobbin(
        &self,
        gateway: &dyn ChatGateway,
        channel: &ChannelRef,
        amount: Amount,
        name: &str,
    ) -> Result<usize, BotError> {
        let thread = gateway.create_thread(channel, name).await?;
        tracing::info!("Created thread {} in {}", thread.name, channel);

        let moved = gateway
            .purge(channel, amount.limit(), &MessageFilter::All)
            .await?;
        self.relay(gateway, &thread, moved).await
    }

    /// Pin the last messages of a channel, oldest first
    pub async fn pin(
        &self,
        gateway: &dyn ChatGateway,
        channel: &ChannelRef,
        amount: Amount,
    ) -> Result<usize, BotError> {
        let messages = chronological(gateway.history(channel, amount.limit()).await?);
        for msg in &messages {
            gateway.pin(channel.id, msg.id, PIN_REASON).await?;
        }
        Ok(messages.len())
    }

    /// Repost the last messages of `channel` into `target`
    pub async fn copy(
        &self,
        gateway: &dyn ChatGateway,
        channel: &ChannelRef,
        amount: Amount,
        target: &ChannelRef,
    ) -> Result<usize, BotError> {
        let messages = gateway.history(channel, amount.limit()).await?;
        self.relay(gateway, target, messages).await
    }

    /// Like `copy`, but the originals are deleted first
    pub async fn relocate(
        &self,
        gateway: &dyn ChatGateway,
        channel: &ChannelRef,
        amount: Amount,
        target: &ChannelRef,
    ) -> Result<usize, BotError> {
        let messages = gateway
            .purge(channel, amount.limit(), &MessageFilter::All)
            .await?;
        self.relay(gateway, target, messages).await
    }

    /// Write the last messages to a backup file and upload it to the channel
    pub async fn save(
        &self,
        gateway: &dyn ChatGateway,
        channel: &ChannelRef,
        amount: Amount,
        directory: &Path,
    ) -> Result<PathBuf, BotError> {
        let messages = chronological(gateway.history(channel, amount.limit()).await?);

        let mut body = String::new();
        for msg in &messages {
            body.push_str(&self.formatter.format(msg, false)?);
            body.push_str("\n\n");
        }

        tokio::fs::create_dir_all(directory).await?;
        let path = directory.join(backup_name(channel));
        tokio::fs::write(&path, body).await?;
        tracing::info!("Saved {} messages to {}", messages.len(), path.display());

        gateway.send_file(channel.id, &path).await?;
        Ok(path)
    }

    /// Ask for a reaction, then delete the last messages (optionally only from `members`)
    pub async fn remove(
        &self,
        gateway: &dyn ChatGateway,
        channel: &ChannelRef,
        amount: Amount,
        members: &[Author],
        timeout: Duration,
    ) -> Result<Removal, BotError> {
        let prompt = gateway.send(channel.id, CONFIRM_PROMPT).await?;

        if !gateway.await_reaction(channel.id, prompt, timeout).await? {
            gateway.edit(channel.id, prompt, CONFIRM_TIMEOUT_TEXT).await?;
            return Ok(Removal::TimedOut);
        }
        gateway.delete_message(channel.id, prompt).await?;

        let removed = gateway
            .purge(channel, amount.limit(), &MessageFilter::authors(members))
            .await?;
        Ok(Removal::Removed(removed.len()))
    }

    async fn relay(
        &self,
        gateway: &dyn ChatGateway,
        target: &ChannelRef,
        messages: Vec<ArchivedMessage>,
    ) -> Result<usize, BotError> {
        let messages = chronological(messages);
        for msg in &messages {
            let text = self.formatter.format(msg, true)?;
            gateway.send(target.id, &text).await?;
        }
        Ok(messages.len())
    }
}

/// `Backup of <guild>@<channel> at <date>`, with path separators replaced
pub fn backup_name(channel: &ChannelRef) -> String {
    let name = format!(
        "Backup of {}@{} at {}",
        channel.guild.name,
        channel.name,
        Utc::now().format("%Y-%m-%d %H-%M-%S")
    );
    name.replace(['/', '\\'], "_")
}

