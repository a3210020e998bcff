//! Rendering messages and audit entries through the format sheet

pub mod sheet;
pub mod template;

use std::sync::Arc;

use crate::application::errors::SheetError;
use crate::domain::entities::ArchivedMessage;

pub use sheet::{Sheet, DEFAULT_SHEET};
pub use template::{render, Values};

/// Timestamp layout used in formatted messages
pub const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Formats archived messages with the sheet's `msg` section
#[derive(Debug, Clone)]
pub struct MessageFormatter {
    sheet: Arc<Sheet>,
}

impl MessageFormatter {
    pub fn new(sheet: Arc<Sheet>) -> Self {
        Self { sheet }
    }

    pub fn sheet(&self) -> &Sheet {
        &self.sheet
    }

    /// Render one message.
    ///
    /// With `for_discord` the author and channel are mentions, which Discord
    /// turns into links. Without it they are plain names, for text that leaves
    /// Discord (backups), where a mention would only show a raw id.
    pub fn format(&self, msg: &ArchivedMessage, for_discord: bool) -> Result<String, SheetError> {
        let (author, channel) = if for_discord {
            (msg.author.mention(), msg.channel.mention())
        } else {
            (msg.author.name.clone(), msg.channel.name.clone())
        };
        let date = msg.created_at.format(DATE_FORMAT).to_string();

        let mut values = Values::new();
        values.insert("author", &author);
        values.insert("guild", &msg.channel.guild.name);
        values.insert("channel", &channel);
        values.insert("date", &date);
        values.insert("content", &msg.content);

        self.sheet.render("msg", &values)
    }
}
