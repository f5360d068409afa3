// src/lib.rs
// AnimeHub Sync - library synchronization and backup engine
//
// Architecture:
// - Domain-centric: normalization and invariants live in the domain
// - One writer: every library mutation goes through LibraryStore
// - Explicit: sessions are built and passed, no module-level singletons
// - Best-effort batches: per-item failures are reported, never raised
// - Local-first: SQLite by default, the catalog is read-only

// ============================================================================
// FOUNDATION
// ============================================================================

pub mod config;
pub mod db;
pub mod domain;
pub mod error;
pub mod events;
pub mod infrastructure;
pub mod repositories;
pub mod services;

// ============================================================================
// APPLICATION LAYER
// ============================================================================

pub mod application;
pub mod integrations;

// ============================================================================
// PUBLIC API - Configuration
// ============================================================================

pub use config::{CatalogConfig, EnrichmentConfig, SyncConfig};

// ============================================================================
// PUBLIC API - Domain
// ============================================================================

pub use domain::{
    normalize,
    validate_favorite_cap,
    validate_library_entry,
    CatalogPayload,
    DomainError,
    EntryInput,
    ImportRecord,
    LibraryEntry,
    WatchStatus,
};

// ============================================================================
// PUBLIC API - Error Types
// ============================================================================

pub use error::{AppError, AppResult};

// ============================================================================
// PUBLIC API - Events
// ============================================================================

pub use events::{
    DomainEvent,
    EnrichmentPassCompleted,
    EventBus,
    EventLogEntry,
    FavoriteChanged,
    ImportCommitted,
    LibraryEntryRemoved,
    LibraryEntryUpserted,
};

// ============================================================================
// PUBLIC API - Database
// ============================================================================

pub use db::{create_connection_pool, initialize_database, ConnectionPool};

// ============================================================================
// PUBLIC API - Repositories
// ============================================================================

pub use repositories::{
    InMemoryLibraryRepository,
    LibraryRepository,
    LibrarySnapshot,
    SqliteLibraryRepository,
};

// ============================================================================
// PUBLIC API - Backup Codec
// ============================================================================

pub use infrastructure::{
    parse_foreign_xml,
    parse_json,
    read_import_file,
    serialize_csv,
    serialize_json,
    write_export_file,
    BackupFormat,
};

// ============================================================================
// PUBLIC API - Services
// ============================================================================

pub use services::{
    EnrichmentQueue,
    EnrichmentReport,
    ImportCommitter,
    ImportReport,
    ItemFailure,
    LibraryStore,
    Progress,
    ProgressFn,
};

// ============================================================================
// PUBLIC API - Application Layer
// ============================================================================

pub use application::{ErrorResponse, ErrorType, SyncSession};

pub use application::commands;

// ============================================================================
// PUBLIC API - Integrations
// ============================================================================

pub use integrations::{CatalogSource, JikanClient};
