//! Domain layer - Core business logic with no external dependencies
//! 
//! This layer contains:
//! - Entities: Core objects (Author, Channel, ArchivedMessage, Command)
//! - Traits: Abstractions for infrastructure (ChatGateway)
//! - Rules: Discord limits that commands must respect

pub mod entities;
pub mod rules;
pub mod traits;
