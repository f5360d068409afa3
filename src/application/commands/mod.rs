// src/application/commands/mod.rs
//
// Command Handlers
//
// ARCHITECTURE:
// - Commands are thin adapters between the embedding UI and the services
// - Commands handle error conversion (serialized ErrorResponse)
// - Commands NEVER contain business logic

pub mod backup_commands;
pub mod library_commands;

pub use backup_commands::*;
pub use library_commands::*;
