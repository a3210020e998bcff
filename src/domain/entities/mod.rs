//! Domain entities - Core objects with no external dependencies

pub mod user;
pub mod channel;
pub mod message;
pub mod command;

pub use user::Author;
pub use channel::{ChannelRef, GuildRef};
pub use message::{chronological, Amount, ArchivedMessage, Incoming};
pub use command::{Command, CommandRegistry};
