use super::{Author, ChannelRef, GuildRef};
use chrono::{DateTime, Utc};

/// A message as commands see it, independent of the chat library
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchivedMessage {
    pub id: u64,
    pub channel: ChannelRef,
    pub author: Author,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl ArchivedMessage {
    pub fn new(
        id: u64,
        channel: ChannelRef,
        author: Author,
        content: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            channel,
            author,
            content: content.into(),
            created_at,
        }
    }
}

/// A message received from the gateway, possibly a command invocation
#[derive(Debug, Clone)]
pub struct Incoming {
    pub id: u64,
    pub author: Author,
    pub author_is_bot: bool,
    pub channel_id: u64,
    /// Present only for messages sent inside a guild
    pub channel: Option<ChannelRef>,
    pub content: String,
}

impl Incoming {
    pub fn in_guild(id: u64, author: Author, channel: ChannelRef, content: impl Into<String>) -> Self {
        Self {
            id,
            author,
            author_is_bot: false,
            channel_id: channel.id,
            channel: Some(channel),
            content: content.into(),
        }
    }

    pub fn direct(id: u64, author: Author, channel_id: u64, content: impl Into<String>) -> Self {
        Self {
            id,
            author,
            author_is_bot: false,
            channel_id,
            channel: None,
            content: content.into(),
        }
    }

    pub fn from_bot(mut self) -> Self {
        self.author_is_bot = true;
        self
    }

    pub fn guild(&self) -> Option<&GuildRef> {
        self.channel.as_ref().map(|c| &c.guild)
    }
}

/// How many of the most recent messages a command acts on.
/// `None` covers the whole channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Amount(pub Option<usize>);

impl Amount {
    pub const ALL: Amount = Amount(None);

    pub fn limit(&self) -> Option<usize> {
        self.0
    }

    /// Text used in audit entries: the number, or `all`.
    /// Zero reads as `all` as well, matching how the count is shown elsewhere.
    pub fn describe(&self) -> String {
        match self.0 {
            Some(n) if n > 0 => n.to_string(),
            _ => "all".to_string(),
        }
    }
}

/// Sort messages oldest first, the order they are replayed in.
pub fn chronological(mut messages: Vec<ArchivedMessage>) -> Vec<ArchivedMessage> {
    messages.sort_by_key(|m| (m.created_at, m.id));
    messages
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn message(id: u64, secs: i64) -> ArchivedMessage {
        let channel = ChannelRef::new(1, "general", GuildRef::new(2, "Home"));
        ArchivedMessage::new(
            id,
            channel,
            Author::new(3, "ann"),
            format!("m{}", id),
            Utc.timestamp_opt(secs, 0).single().unwrap(),
        )
    }

    #[test]
    fn test_chronological_sorts_oldest_first() {
        let sorted = chronological(vec![message(3, 30), message(1, 10), message(2, 20)]);
        let ids: Vec<u64> = sorted.iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_amount_describe() {
        assert_eq!(Amount(Some(5)).describe(), "5");
        assert_eq!(Amount(Some(0)).describe(), "all");
        assert_eq!(Amount::ALL.describe(), "all");
    }
}
