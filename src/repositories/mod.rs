// src/repositories/mod.rs
//
// Repository layer
//
// CRITICAL RULES:
// - Repositories are DUMB data mappers
// - NO normalization, NO progress rules
// - NO event emission
// - Explicit SQL only

pub mod library_repository;
pub mod memory_library_repository;

pub use library_repository::{LibraryRepository, LibrarySnapshot, SqliteLibraryRepository};
pub use memory_library_repository::InMemoryLibraryRepository;

#[cfg(test)]
pub use library_repository::MockLibraryRepository;
