//! Audit trail: a note in the guild's audit channel for every command

use std::sync::Arc;

use crate::application::errors::BotError;
use crate::application::formatting::{Sheet, Values};
use crate::application::services::Invocation;
use crate::domain::traits::ChatGateway;

/// Name of the channel audit entries go to, unless configured otherwise
pub const DEFAULT_AUDIT_CHANNEL: &str = "audit";

pub struct AuditService {
    sheet: Arc<Sheet>,
    channel_name: String,
}

impl AuditService {
    pub fn new(sheet: Arc<Sheet>, channel_name: impl Into<String>) -> Self {
        Self {
            sheet,
            channel_name: channel_name.into(),
        }
    }

    /// Post the sheet section named after the command to the audit channel.
    ///
    /// Nothing is posted when the guild has no audit channel or when the
    /// sheet has no usable section for the command. Returns the id of the
    /// audit message, if one was sent.
    pub async fn record(
        &self,
        gateway: &dyn ChatGateway,
        invocation: &Invocation,
    ) -> Result<Option<u64>, BotError> {
        let Some(channel) = invocation.channel.as_ref() else {
            return Ok(None);
        };
        let Some(audit_channel) = gateway.find_channel(&channel.guild, &self.channel_name).await? else {
            return Ok(None);
        };

        let author = invocation.author.mention();
        let channel_mention = channel.mention();
        let amount = invocation.operation.amount().describe();
        let destination = invocation.operation.destination().unwrap_or_default();
        let members = invocation.operation.members_text();

        let mut values = Values::new();
        values.insert("author", &author);
        values.insert("guild", &channel.guild.name);
        values.insert("channel", &channel_mention);
        values.insert("amt", &amount);
        values.insert("new_channel", &destination);
        values.insert("members", &members);

        match self.sheet.render(&invocation.command, &values) {
            Ok(text) => Ok(Some(gateway.send(audit_channel.id, &text).await?)),
            Err(e) => {
                tracing::debug!("Skipping audit for {}: {}", invocation.command, e);
                Ok(None)
            }
        }
    }
}
