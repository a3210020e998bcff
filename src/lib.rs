//! hilda - a Discord bot for managing server messages

pub mod application;
pub mod domain;
pub mod infrastructure;
