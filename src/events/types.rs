// events/types.rs
//
// All domain events in the system.
// Each event represents an immutable fact that has already occurred.
//
// CRITICAL RULES:
// - Events are facts, not commands
// - Events carry only the data needed to react

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::WatchStatus;

/// Trait that all domain events must implement
pub trait DomainEvent: std::fmt::Debug + Clone {
    fn event_id(&self) -> Uuid;

    fn occurred_at(&self) -> DateTime<Utc>;

    /// Human-readable event type name
    fn event_type(&self) -> &'static str;
}

macro_rules! domain_event {
    ($name:ident) => {
        impl DomainEvent for $name {
            fn event_id(&self) -> Uuid {
                self.event_id
            }
            fn occurred_at(&self) -> DateTime<Utc> {
                self.occurred_at
            }
            fn event_type(&self) -> &'static str {
                stringify!($name)
            }
        }
    };
}

// ============================================================================
// LIBRARY ENTRY EVENTS
// ============================================================================

/// Emitted after an entry was created or rewritten
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LibraryEntryUpserted {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub entry_id: String,
    pub status: WatchStatus,
}

impl LibraryEntryUpserted {
    pub fn new(entry_id: String, status: WatchStatus) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            entry_id,
            status,
        }
    }
}

domain_event!(LibraryEntryUpserted);

/// Emitted when an entry left the library
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LibraryEntryRemoved {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub entry_id: String,
}

impl LibraryEntryRemoved {
    pub fn new(entry_id: String) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            entry_id,
        }
    }
}

domain_event!(LibraryEntryRemoved);

/// Emitted when the favorite flag of an entry flipped
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FavoriteChanged {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub entry_id: String,
    pub is_favorite: bool,
}

impl FavoriteChanged {
    pub fn new(entry_id: String, is_favorite: bool) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            entry_id,
            is_favorite,
        }
    }
}

domain_event!(FavoriteChanged);

// ============================================================================
// BATCH EVENTS
// ============================================================================

/// Emitted when one enrichment call finished (fully or by cancellation)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichmentPassCompleted {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub total: usize,
    pub refreshed: usize,
    pub failed: usize,
    pub cancelled: bool,
}

impl EnrichmentPassCompleted {
    pub fn new(total: usize, refreshed: usize, failed: usize, cancelled: bool) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            total,
            refreshed,
            failed,
            cancelled,
        }
    }
}

domain_event!(EnrichmentPassCompleted);

/// Emitted when an import finished committing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportCommitted {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub available: usize,
    pub written: usize,
    pub skipped: usize,
    pub failed: usize,
    pub cancelled: bool,
}

impl ImportCommitted {
    pub fn new(available: usize, written: usize, skipped: usize, failed: usize, cancelled: bool) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            available,
            written,
            skipped,
            failed,
            cancelled,
        }
    }
}

domain_event!(ImportCommitted);
