//! In-memory chat gateway for development and tests

use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::RwLock;

use crate::application::errors::BotError;
use crate::application::messaging::parser::{parse_channel_ref, parse_snowflake, parse_user_ref};
use crate::domain::entities::{ArchivedMessage, Author, ChannelRef, GuildRef, Incoming};
use crate::domain::rules::{split_message, MESSAGE_MAX_LEN};
use crate::domain::traits::ChatGateway;

/// First id handed out; large enough to read as a snowflake
const FIRST_ID: u64 = 100_000_000_000_000_000;

#[derive(Debug, Clone)]
struct Member {
    author: Author,
    nick: Option<String>,
}

#[derive(Debug, Default)]
struct State {
    guilds: Vec<GuildRef>,
    channels: Vec<ChannelRef>,
    members: HashMap<u64, Vec<Member>>,
    /// Per channel, oldest first
    messages: HashMap<u64, Vec<ArchivedMessage>>,
    pins: HashMap<u64, Vec<u64>>,
    files: Vec<(u64, PathBuf)>,
}

/// A fake Discord: guilds, channels and messages held in memory
pub struct MemoryGateway {
    state: RwLock<State>,
    bot: Author,
    next_id: AtomicU64,
    epoch: DateTime<Utc>,
    confirm: AtomicBool,
    echo: bool,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(State::default()),
            bot: Author::new(FIRST_ID - 1, "hilda"),
            next_id: AtomicU64::new(FIRST_ID),
            epoch: Utc::now() - ChronoDuration::days(1),
            confirm: AtomicBool::new(true),
            echo: false,
        }
    }

    /// Print everything the bot sends, like a console
    pub fn with_echo(mut self) -> Self {
        self.echo = true;
        self
    }

    /// Whether confirmation prompts receive a reaction
    pub fn set_confirm(&self, confirm: bool) {
        self.confirm.store(confirm, Ordering::SeqCst);
    }

    fn next_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }

    /// Ids double as a clock so message order is deterministic
    fn timestamp(&self, id: u64) -> DateTime<Utc> {
        self.epoch + ChronoDuration::seconds((id - FIRST_ID) as i64)
    }

    pub async fn add_guild(&self, name: &str) -> GuildRef {
        let guild = GuildRef::new(self.next_id(), name);
        self.state.write().await.guilds.push(guild.clone());
        guild
    }

    pub async fn add_channel(&self, guild: &GuildRef, name: &str) -> ChannelRef {
        let channel = ChannelRef::new(self.next_id(), name, guild.clone());
        self.state.write().await.channels.push(channel.clone());
        channel
    }

    pub async fn add_member(&self, guild: &GuildRef, name: &str, nick: Option<&str>) -> Author {
        let author = Author::new(self.next_id(), name);
        self.state
            .write()
            .await
            .members
            .entry(guild.id)
            .or_default()
            .push(Member {
                author: author.clone(),
                nick: nick.map(str::to_string),
            });
        author
    }

    /// Post a message as `author`
    pub async fn post(&self, channel_id: u64, author: &Author, content: &str) -> Result<u64, BotError> {
        let mut state = self.state.write().await;
        let channel = state
            .channels
            .iter()
            .find(|c| c.id == channel_id)
            .cloned()
            .ok_or_else(|| BotError::NotFound(format!("channel {}", channel_id)))?;

        let id = self.next_id();
        let message = ArchivedMessage::new(id, channel.clone(), author.clone(), content, self.timestamp(id));
        state.messages.entry(channel_id).or_default().push(message);

        if self.echo {
            println!("[{}] {}: {}", channel, author, content);
        }
        Ok(id)
    }

    /// Post `content` as `author` and return it as a received message
    pub async fn receive(&self, channel: &ChannelRef, author: &Author, content: &str) -> Result<Incoming, BotError> {
        let id = self.post(channel.id, author, content).await?;
        Ok(Incoming::in_guild(id, author.clone(), channel.clone(), content))
    }

    /// Messages of a channel, oldest first
    pub async fn messages(&self, channel_id: u64) -> Vec<ArchivedMessage> {
        self.state
            .read()
            .await
            .messages
            .get(&channel_id)
            .cloned()
            .unwrap_or_default()
    }

    pub async fn pinned(&self, channel_id: u64) -> Vec<u64> {
        self.state
            .read()
            .await
            .pins
            .get(&channel_id)
            .cloned()
            .unwrap_or_default()
    }

    pub async fn files(&self) -> Vec<(u64, PathBuf)> {
        self.state.read().await.files.clone()
    }

    pub async fn channels(&self) -> Vec<ChannelRef> {
        self.state.read().await.channels.clone()
    }
}

impl Default for MemoryGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChatGateway for MemoryGateway {
    async fn history(&self, channel: &ChannelRef, limit: Option<usize>) -> Result<Vec<ArchivedMessage>, BotError> {
        let state = self.state.read().await;
        let messages = state.messages.get(&channel.id).map(Vec::as_slice).unwrap_or_default();
        Ok(messages
            .iter()
            .rev()
            .take(limit.unwrap_or(usize::MAX))
            .cloned()
            .collect())
    }

    async fn delete_messages(&self, channel_id: u64, messages: &[ArchivedMessage]) -> Result<(), BotError> {
        let mut state = self.state.write().await;
        if let Some(list) = state.messages.get_mut(&channel_id) {
            list.retain(|m| !messages.iter().any(|d| d.id == m.id));
        }
        Ok(())
    }

    async fn delete_message(&self, channel_id: u64, message_id: u64) -> Result<(), BotError> {
        let mut state = self.state.write().await;
        let list = state.messages.entry(channel_id).or_default();
        let before = list.len();
        list.retain(|m| m.id != message_id);
        if list.len() == before {
            return Err(BotError::NotFound(format!("message {}", message_id)));
        }
        Ok(())
    }

    async fn send(&self, channel_id: u64, text: &str) -> Result<u64, BotError> {
        let mut first = None;
        for part in split_message(text, MESSAGE_MAX_LEN) {
            let id = self.post(channel_id, &self.bot, &part).await?;
            first.get_or_insert(id);
        }
        first.ok_or_else(|| BotError::Internal("nothing sent".to_string()))
    }

    async fn edit(&self, channel_id: u64, message_id: u64, text: &str) -> Result<(), BotError> {
        let mut state = self.state.write().await;
        let message = state
            .messages
            .get_mut(&channel_id)
            .and_then(|list| list.iter_mut().find(|m| m.id == message_id))
            .ok_or_else(|| BotError::NotFound(format!("message {}", message_id)))?;
        message.content = text.to_string();
        Ok(())
    }

    async fn send_file(&self, channel_id: u64, path: &Path) -> Result<u64, BotError> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let id = self.post(channel_id, &self.bot, &format!("[attachment] {}", name)).await?;
        self.state.write().await.files.push((channel_id, path.to_path_buf()));
        Ok(id)
    }

    async fn pin(&self, channel_id: u64, message_id: u64, _reason: &str) -> Result<(), BotError> {
        let mut state = self.state.write().await;
        let exists = state
            .messages
            .get(&channel_id)
            .is_some_and(|list| list.iter().any(|m| m.id == message_id));
        if !exists {
            return Err(BotError::NotFound(format!("message {}", message_id)));
        }
        state.pins.entry(channel_id).or_default().push(message_id);
        Ok(())
    }

    async fn create_thread(&self, parent: &ChannelRef, name: &str) -> Result<ChannelRef, BotError> {
        Ok(self.add_channel(&parent.guild, name).await)
    }

    async fn find_channel(&self, guild: &GuildRef, name: &str) -> Result<Option<ChannelRef>, BotError> {
        let state = self.state.read().await;
        Ok(state
            .channels
            .iter()
            .find(|c| c.guild.id == guild.id && c.name == name)
            .cloned())
    }

    async fn find_guild(&self, token: &str) -> Result<Option<GuildRef>, BotError> {
        let state = self.state.read().await;
        let by_id = parse_snowflake(token);
        Ok(state
            .guilds
            .iter()
            .find(|g| Some(g.id) == by_id || g.name == token)
            .cloned())
    }

    async fn resolve_channel(&self, guild: &GuildRef, token: &str) -> Result<Option<ChannelRef>, BotError> {
        let state = self.state.read().await;
        let in_guild = |c: &&ChannelRef| c.guild.id == guild.id;
        let found = match parse_channel_ref(token) {
            Some(id) => state.channels.iter().filter(in_guild).find(|c| c.id == id),
            None => state.channels.iter().filter(in_guild).find(|c| c.name == token),
        };
        Ok(found.cloned())
    }

    async fn resolve_member(&self, guild: &GuildRef, token: &str) -> Result<Option<Author>, BotError> {
        let state = self.state.read().await;
        let members = state.members.get(&guild.id).map(Vec::as_slice).unwrap_or_default();
        let found = match parse_user_ref(token) {
            Some(id) => members.iter().find(|m| m.author.id == id),
            None => members
                .iter()
                .find(|m| m.author.name == token || m.nick.as_deref() == Some(token)),
        };
        Ok(found.map(|m| m.author.clone()))
    }

    async fn await_reaction(&self, _channel_id: u64, _message_id: u64, _timeout: Duration) -> Result<bool, BotError> {
        Ok(self.confirm.load(Ordering::SeqCst))
    }
}
