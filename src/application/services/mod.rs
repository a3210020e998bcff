//! Application services - command logic over the chat gateway

pub mod audit_service;
pub mod command_service;
pub mod message_service;

pub use audit_service::AuditService;
pub use command_service::{CommandService, CommandSettings, Invocation, Operation};
pub use message_service::MessageService;
