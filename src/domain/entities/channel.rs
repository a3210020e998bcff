use std::fmt;

/// A server the bot is a member of
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GuildRef {
    pub id: u64,
    pub name: String,
}

impl GuildRef {
    pub fn new(id: u64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

impl fmt::Display for GuildRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// A text channel or thread inside a guild
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChannelRef {
    pub id: u64,
    pub name: String,
    pub guild: GuildRef,
}

impl ChannelRef {
    pub fn new(id: u64, name: impl Into<String>, guild: GuildRef) -> Self {
        Self {
            id,
            name: name.into(),
            guild,
        }
    }

    /// Discord mention markup, e.g. `<#1234>`
    pub fn mention(&self) -> String {
        format!("<#{}>", self.id)
    }
}

/// Renders as `Server@channel`, the same form `cp` and `mv` accept.
impl fmt::Display for ChannelRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.guild.name, self.name)
    }
}
