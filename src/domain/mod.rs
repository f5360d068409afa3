// src/domain/mod.rs
//
// Domain Root - The Single Source of Truth for Domain API
//
// This file MUST declare all domain modules and re-export their public API.
// All other modules import from `crate::domain::*`

// ============================================================================
// MODULE DECLARATIONS
// ============================================================================

pub mod library_entry;
pub mod normalization;

// ============================================================================
// PUBLIC API RE-EXPORTS
// ============================================================================

// Library Entry Domain
pub use library_entry::{
    validate_favorite_cap, validate_library_entry, LibraryEntry, WatchStatus,
};

// Normalization
pub use normalization::{
    normalize, CatalogPayload, EntryInput, ImageVariants, ImportRecord, RawId, TagRef,
};

// ============================================================================
// DOMAIN ERROR TYPES
// ============================================================================

use thiserror::Error;

/// Domain-level errors
/// These represent violations of business rules and invariants
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    #[error("Progress {current} exceeds total episodes {total}")]
    ProgressExceedsTotal { current: u32, total: u32 },

    #[error("Favorite limit of {max} reached")]
    FavoriteLimitReached { max: usize },

    #[error("Normalization failed: {0}")]
    Normalization(String),
}

/// Domain result type
pub type DomainResult<T> = Result<T, DomainError>;
