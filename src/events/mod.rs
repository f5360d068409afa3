// src/events/mod.rs
//
// Internal Event System - Public API

pub mod bus;
pub mod types;

pub use types::{
    DomainEvent,
    EnrichmentPassCompleted,
    FavoriteChanged,
    ImportCommitted,
    LibraryEntryRemoved,
    LibraryEntryUpserted,
};

pub use bus::{EventBus, EventLogEntry};
