//! `ChatGateway` over serenity's HTTP client, cache and collectors

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use serenity::all::{
    Channel, ChannelId, ChannelType, Context, CreateAttachment, CreateMessage, CreateThread,
    EditMessage, GetMessages, GuildChannel, GuildId, Member, Message, MessageId, UserId,
};
use serenity::collector::ReactionCollector;

use crate::application::errors::BotError;
use crate::application::messaging::parser::{parse_channel_ref, parse_snowflake, parse_user_ref};
use crate::domain::entities::{ArchivedMessage, Author, ChannelRef, GuildRef, Incoming};
use crate::domain::rules::{plan_deletion, split_message, MESSAGE_MAX_LEN};
use crate::domain::traits::ChatGateway;

/// Most messages Discord returns per history request
const PAGE_SIZE: usize = 100;

/// Gateway bound to the context of one event
pub struct DiscordGateway {
    ctx: Context,
}

impl DiscordGateway {
    pub fn new(ctx: Context) -> Self {
        Self { ctx }
    }

    /// Convert a received serenity message, resolving guild and channel names
    pub async fn incoming(&self, message: &Message) -> Result<Incoming, BotError> {
        let author = author_of(message);
        let mut incoming = match message.guild_id {
            Some(guild_id) => {
                let channel = self.channel_ref(guild_id, message.channel_id).await?;
                Incoming::in_guild(message.id.get(), author, channel, &message.content)
            }
            None => Incoming::direct(message.id.get(), author, message.channel_id.get(), &message.content),
        };
        incoming.author_is_bot = message.author.bot;
        Ok(incoming)
    }

    async fn guild_ref(&self, guild_id: GuildId) -> Result<GuildRef, BotError> {
        let cached = self.ctx.cache.guild(guild_id).map(|g| g.name.clone());
        let name = match cached {
            Some(name) => name,
            None => guild_id.to_partial_guild(&self.ctx).await?.name,
        };
        Ok(GuildRef::new(guild_id.get(), name))
    }

    async fn channel_ref(&self, guild_id: GuildId, channel_id: ChannelId) -> Result<ChannelRef, BotError> {
        let guild = self.guild_ref(guild_id).await?;

        let cached = self.ctx.cache.guild(guild_id).and_then(|g| {
            g.channels
                .get(&channel_id)
                .map(|c| c.name.clone())
                .or_else(|| g.threads.iter().find(|t| t.id == channel_id).map(|t| t.name.clone()))
        });
        let name = match cached {
            Some(name) => name,
            None => match channel_id.to_channel(&self.ctx).await? {
                Channel::Guild(channel) => channel.name,
                _ => return Err(BotError::NotFound(format!("guild channel {}", channel_id))),
            },
        };
        Ok(ChannelRef::new(channel_id.get(), name, guild))
    }

    async fn text_channels(&self, guild: &GuildRef) -> Result<HashMap<ChannelId, GuildChannel>, BotError> {
        let mut channels = GuildId::new(guild.id).channels(&self.ctx).await?;
        channels.retain(|_, c| matches!(c.kind, ChannelType::Text | ChannelType::News));
        Ok(channels)
    }

    fn to_channel_ref(channel: &GuildChannel, guild: &GuildRef) -> ChannelRef {
        ChannelRef::new(channel.id.get(), channel.name.clone(), guild.clone())
    }
}

fn author_of(message: &Message) -> Author {
    Author::new(message.author.id.get(), message.author.name.clone())
}

fn member_author(member: &Member) -> Author {
    Author::new(member.user.id.get(), member.user.name.clone())
}

fn archive(message: &Message, channel: &ChannelRef) -> ArchivedMessage {
    ArchivedMessage::new(
        message.id.get(),
        channel.clone(),
        author_of(message),
        message.content.clone(),
        message.timestamp.to_utc(),
    )
}

#[async_trait]
impl ChatGateway for DiscordGateway {
    async fn history(&self, channel: &ChannelRef, limit: Option<usize>) -> Result<Vec<ArchivedMessage>, BotError> {
        let channel_id = ChannelId::new(channel.id);
        let mut messages = Vec::new();
        let mut before: Option<MessageId> = None;

        loop {
            let want = match limit {
                Some(limit) => limit.saturating_sub(messages.len()).min(PAGE_SIZE),
                None => PAGE_SIZE,
            };
            if want == 0 {
                break;
            }

            let mut request = GetMessages::new().limit(want as u8);
            if let Some(before) = before {
                request = request.before(before);
            }
            let page = channel_id.messages(&self.ctx, request).await?;
            let fetched = page.len();
            before = page.last().map(|m| m.id);
            messages.extend(page.iter().map(|m| archive(m, channel)));

            if fetched < want {
                break;
            }
        }

        Ok(messages)
    }

    async fn delete_messages(&self, channel_id: u64, messages: &[ArchivedMessage]) -> Result<(), BotError> {
        let channel = ChannelId::new(channel_id);
        let plan = plan_deletion(Utc::now(), messages);

        for batch in &plan.bulk {
            let ids: Vec<MessageId> = batch.iter().map(|id| MessageId::new(*id)).collect();
            channel.delete_messages(&self.ctx, &ids).await?;
        }
        for id in &plan.single {
            channel.delete_message(&self.ctx, MessageId::new(*id)).await?;
        }

        tracing::debug!(
            "Deleted {} messages in {} ({} bulk requests, {} single)",
            messages.len(),
            channel_id,
            plan.bulk.len(),
            plan.single.len()
        );
        Ok(())
    }

    async fn delete_message(&self, channel_id: u64, message_id: u64) -> Result<(), BotError> {
        ChannelId::new(channel_id)
            .delete_message(&self.ctx, MessageId::new(message_id))
            .await?;
        Ok(())
    }

    async fn send(&self, channel_id: u64, text: &str) -> Result<u64, BotError> {
        let channel = ChannelId::new(channel_id);
        let mut first = None;
        for part in split_message(text, MESSAGE_MAX_LEN) {
            let sent = channel
                .send_message(&self.ctx, CreateMessage::new().content(part))
                .await?;
            first.get_or_insert(sent.id.get());
        }
        first.ok_or_else(|| BotError::Internal("nothing sent".to_string()))
    }

    async fn edit(&self, channel_id: u64, message_id: u64, text: &str) -> Result<(), BotError> {
        ChannelId::new(channel_id)
            .edit_message(&self.ctx, MessageId::new(message_id), EditMessage::new().content(text))
            .await?;
        Ok(())
    }

    async fn send_file(&self, channel_id: u64, path: &Path) -> Result<u64, BotError> {
        let attachment = CreateAttachment::path(path).await?;
        let sent = ChannelId::new(channel_id)
            .send_message(&self.ctx, CreateMessage::new().add_file(attachment))
            .await?;
        Ok(sent.id.get())
    }

    async fn pin(&self, channel_id: u64, message_id: u64, reason: &str) -> Result<(), BotError> {
        self.ctx
            .http
            .pin_message(ChannelId::new(channel_id), MessageId::new(message_id), Some(reason))
            .await?;
        Ok(())
    }

    async fn create_thread(&self, parent: &ChannelRef, name: &str) -> Result<ChannelRef, BotError> {
        let thread = ChannelId::new(parent.id)
            .create_thread(&self.ctx, CreateThread::new(name).kind(ChannelType::PublicThread))
            .await?;
        Ok(Self::to_channel_ref(&thread, &parent.guild))
    }

    async fn find_channel(&self, guild: &GuildRef, name: &str) -> Result<Option<ChannelRef>, BotError> {
        let channels = self.text_channels(guild).await?;
        Ok(channels
            .values()
            .find(|c| c.name == name)
            .map(|c| Self::to_channel_ref(c, guild)))
    }

    async fn find_guild(&self, token: &str) -> Result<Option<GuildRef>, BotError> {
        let by_id = parse_snowflake(token);
        let found = self.ctx.cache.guilds().into_iter().find_map(|id| {
            let guild = self.ctx.cache.guild(id)?;
            (Some(id.get()) == by_id || guild.name == token).then(|| GuildRef::new(id.get(), guild.name.clone()))
        });
        Ok(found)
    }

    async fn resolve_channel(&self, guild: &GuildRef, token: &str) -> Result<Option<ChannelRef>, BotError> {
        let channels = self.text_channels(guild).await?;
        let found = match parse_channel_ref(token) {
            Some(id) => channels.get(&ChannelId::new(id)),
            None => channels.values().find(|c| c.name == token),
        };
        Ok(found.map(|c| Self::to_channel_ref(c, guild)))
    }

    async fn resolve_member(&self, guild: &GuildRef, token: &str) -> Result<Option<Author>, BotError> {
        let guild_id = GuildId::new(guild.id);

        if let Some(id) = parse_user_ref(token) {
            return match guild_id.member(&self.ctx, UserId::new(id)).await {
                Ok(member) => Ok(Some(member_author(&member))),
                Err(e) => {
                    tracing::debug!("No member {} in {}: {}", id, guild, e);
                    Ok(None)
                }
            };
        }

        let named = |m: &Member| {
            m.user.name == token
                || m.nick.as_deref() == Some(token)
                || m.user.global_name.as_deref() == Some(token)
        };

        let cached = self
            .ctx
            .cache
            .guild(guild_id)
            .and_then(|g| g.members.values().find(|&m| named(m)).map(member_author));
        if cached.is_some() {
            return Ok(cached);
        }

        let found = guild_id.search_members(&self.ctx, token, Some(10)).await?;
        Ok(found.iter().find(|&m| named(m)).map(member_author))
    }

    async fn await_reaction(&self, channel_id: u64, message_id: u64, timeout: Duration) -> Result<bool, BotError> {
        let reaction = ReactionCollector::new(&self.ctx)
            .channel_id(ChannelId::new(channel_id))
            .message_id(MessageId::new(message_id))
            .timeout(timeout)
            .next()
            .await;
        Ok(reaction.is_some())
    }
}
