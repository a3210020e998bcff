use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;

use crate::application::errors::BotError;
use crate::domain::entities::{ArchivedMessage, Author, ChannelRef, GuildRef};

/// Which messages a purge is allowed to delete
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum MessageFilter {
    #[default]
    All,
    /// Only messages written by one of these user ids
    Authors(Vec<u64>),
}

impl MessageFilter {
    pub fn authors(members: &[Author]) -> Self {
        if members.is_empty() {
            MessageFilter::All
        } else {
            MessageFilter::Authors(members.iter().map(|m| m.id).collect())
        }
    }

    pub fn matches(&self, message: &ArchivedMessage) -> bool {
        match self {
            MessageFilter::All => true,
            MessageFilter::Authors(ids) => ids.contains(&message.author.id),
        }
    }
}

/// ChatGateway trait - abstraction over the chat platform client library
#[async_trait]
pub trait ChatGateway: Send + Sync {
    /// Most recent messages of a channel, newest first. `None` reads the whole channel.
    async fn history(&self, channel: &ChannelRef, limit: Option<usize>) -> Result<Vec<ArchivedMessage>, BotError>;

    /// Delete a set of messages from one channel
    async fn delete_messages(&self, channel_id: u64, messages: &[ArchivedMessage]) -> Result<(), BotError>;

    /// Delete a single message
    async fn delete_message(&self, channel_id: u64, message_id: u64) -> Result<(), BotError>;

    /// Send a text message, returning the id of the (first) message posted
    async fn send(&self, channel_id: u64, text: &str) -> Result<u64, BotError>;

    /// Replace the content of a message the bot sent
    async fn edit(&self, channel_id: u64, message_id: u64, text: &str) -> Result<(), BotError>;

    /// Upload a local file as an attachment
    async fn send_file(&self, channel_id: u64, path: &Path) -> Result<u64, BotError>;

    async fn pin(&self, channel_id: u64, message_id: u64, reason: &str) -> Result<(), BotError>;

    /// Create a public thread under `parent`
    async fn create_thread(&self, parent: &ChannelRef, name: &str) -> Result<ChannelRef, BotError>;

    /// Look up a text channel by exact name
    async fn find_channel(&self, guild: &GuildRef, name: &str) -> Result<Option<ChannelRef>, BotError>;

    /// Look up a guild the bot is in by id or name
    async fn find_guild(&self, token: &str) -> Result<Option<GuildRef>, BotError>;

    /// Resolve a channel id, `<#id>` mention, or name within a guild
    async fn resolve_channel(&self, guild: &GuildRef, token: &str) -> Result<Option<ChannelRef>, BotError>;

    /// Resolve a user id, `<@id>` mention, user name, or nickname within a guild
    async fn resolve_member(&self, guild: &GuildRef, token: &str) -> Result<Option<Author>, BotError>;

    /// Wait until someone reacts to the given message. Returns false on timeout.
    async fn await_reaction(&self, channel_id: u64, message_id: u64, timeout: Duration) -> Result<bool, BotError>;

    /// Scan up to `limit` of the newest messages and delete those matching `filter`.
    /// Returns the deleted messages, newest first.
    async fn purge(
        &self,
        channel: &ChannelRef,
        limit: Option<usize>,
        filter: &MessageFilter,
    ) -> Result<Vec<ArchivedMessage>, BotError> {
        let doomed: Vec<ArchivedMessage> = self
            .history(channel, limit)
            .await?
            .into_iter()
            .filter(|m| filter.matches(m))
            .collect();

        if !doomed.is_empty() {
            self.delete_messages(channel.id, &doomed).await?;
        }
        tracing::debug!("Purged {} messages from {}", doomed.len(), channel);
        Ok(doomed)
    }
}
