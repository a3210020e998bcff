use std::sync::Arc;

use serenity::all::{Context, EventHandler, Message, Ready};
use serenity::async_trait;

use crate::application::messaging::{Dispatch, Dispatcher};
use super::DiscordGateway;

/// Discord event handler
pub struct Handler {
    dispatcher: Arc<Dispatcher>,
}

impl Handler {
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        Self { dispatcher }
    }
}

#[async_trait]
impl EventHandler for Handler {
    /// Called when the bot is ready and connected to Discord
    async fn ready(&self, _ctx: Context, ready: Ready) {
        self.dispatcher.parser().set_bot_id(ready.user.id.get());
        tracing::info!("{} is ready for some action!", ready.user.name);
    }

    /// Called when a message is sent in a channel the bot can see
    async fn message(&self, ctx: Context, message: Message) {
        if message.author.bot || self.dispatcher.parser().parse(&message.content).is_none() {
            return;
        }

        let gateway = DiscordGateway::new(ctx);
        let incoming = match gateway.incoming(&message).await {
            Ok(incoming) => incoming,
            Err(e) => {
                tracing::error!("Failed to resolve channel {}: {}", message.channel_id, e);
                return;
            }
        };

        match self.dispatcher.dispatch(&gateway, incoming).await {
            Dispatch::Completed(name) => tracing::debug!("Command {} completed", name),
            Dispatch::Ignored | Dispatch::UnknownCommand(_) => {}
            other => tracing::debug!("Dispatch ended with {:?}", other),
        }
    }
}
