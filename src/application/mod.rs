//! Application layer - Use cases and business logic
//! 
//! This layer contains:
//! - Services: Command logic over the chat gateway
//! - Formatting: The format sheet and message rendering
//! - Errors: Domain-specific errors
//! - Messaging: Parsing, argument conversion, dispatching

pub mod errors;
pub mod formatting;
pub mod messaging;
pub mod services;
