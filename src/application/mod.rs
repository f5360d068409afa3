// src/application/mod.rs
//
// Application Layer
//
// ARCHITECTURE:
// - Sits on top of the services
// - Owns the session wiring (one session per signed-in library)
// - Translates AppError into user-facing responses
// - Never contains business logic

pub mod commands;
pub mod error_handling;
pub mod state;

pub use commands::*;
pub use error_handling::{ErrorResponse, ErrorType, ToErrorResponse};
pub use state::SyncSession;
