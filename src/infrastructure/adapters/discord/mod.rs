//! Discord adapter built on serenity

pub mod gateway;
pub mod handler;

use std::sync::Arc;

use serenity::all::{Client, GatewayIntents};

use crate::application::errors::BotError;
use crate::application::messaging::Dispatcher;

pub use gateway::DiscordGateway;
pub use handler::Handler;

/// Gateway intents the commands rely on.
/// GUILD_MEMBERS and MESSAGE_CONTENT are privileged and must be enabled in
/// the Discord Developer Portal.
pub fn intents() -> GatewayIntents {
    GatewayIntents::GUILDS
        | GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::GUILD_MEMBERS
        | GatewayIntents::GUILD_MESSAGE_REACTIONS
        | GatewayIntents::DIRECT_MESSAGES
        | GatewayIntents::MESSAGE_CONTENT
}

/// Connect to Discord and process events until the client shuts down
pub async fn start_bot(token: &str, dispatcher: Arc<Dispatcher>) -> Result<(), BotError> {
    let mut client = Client::builder(token, intents())
        .event_handler(Handler::new(dispatcher))
        .await?;

    tracing::info!("Connecting to Discord...");
    client.start().await?;

    Ok(())
}

impl From<serenity::Error> for BotError {
    fn from(err: serenity::Error) -> Self {
        BotError::Discord(err.to_string())
    }
}
