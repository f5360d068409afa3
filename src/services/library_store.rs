// src/services/library_store.rs
//
// Canonical Store - the single writer of library entries
//
// CRITICAL RULES:
// - Every write goes through normalize + validate + stamp
// - Favorite cap is checked before any write that sets the flag
// - Enrichment only refreshes entries that still exist
// - Events are emitted after the write lands, never before

use std::sync::Arc;

use chrono::Utc;
use log::{debug, warn};
use tokio::sync::watch;

use crate::domain::{
    normalize, validate_favorite_cap, validate_library_entry, CatalogPayload, DomainError,
    EntryInput, ImportRecord, LibraryEntry, RawId, WatchStatus,
};
use crate::error::{AppError, AppResult};
use crate::events::{EventBus, FavoriteChanged, LibraryEntryRemoved, LibraryEntryUpserted};
use crate::repositories::{LibraryRepository, LibrarySnapshot};

pub struct LibraryStore {
    repo: Arc<dyn LibraryRepository>,
    event_bus: Arc<EventBus>,
    max_favorites: usize,
}

impl LibraryStore {
    pub fn new(
        repo: Arc<dyn LibraryRepository>,
        event_bus: Arc<EventBus>,
        max_favorites: usize,
    ) -> Self {
        Self {
            repo,
            event_bus,
            max_favorites,
        }
    }

    // ========================================================================
    // QUERIES
    // ========================================================================

    /// Live view of the whole collection. Consumers index by `id`.
    pub fn subscribe(&self) -> watch::Receiver<LibrarySnapshot> {
        self.repo.subscribe()
    }

    pub async fn get(&self, id: &str) -> AppResult<Option<LibraryEntry>> {
        self.repo.get(id).await
    }

    pub async fn list(&self) -> AppResult<Vec<LibraryEntry>> {
        self.repo.list_all().await
    }

    pub async fn contains(&self, id: &str) -> AppResult<bool> {
        self.repo.exists(id).await
    }

    pub async fn favorites_count(&self) -> AppResult<usize> {
        self.repo.count_favorites().await
    }

    // ========================================================================
    // MUTATIONS
    // ========================================================================

    /// Merge `candidate` into the stored entry with the same key, or create it.
    /// User-owned fields of a stored entry survive metadata-only inputs.
    pub async fn upsert(
        &self,
        candidate: EntryInput,
        status_override: Option<WatchStatus>,
    ) -> AppResult<LibraryEntry> {
        let existing = match candidate.key() {
            Some(key) => self.repo.get(&key).await?,
            None => None,
        };
        let entry = normalize(candidate, existing.as_ref(), status_override)?;
        self.persist(entry, existing.as_ref()).await
    }

    /// Put a catalog item into the library, `plan_to_watch` unless told otherwise
    pub async fn add_from_catalog(
        &self,
        payload: CatalogPayload,
        status: Option<WatchStatus>,
    ) -> AppResult<LibraryEntry> {
        self.upsert(EntryInput::Catalog(payload), status).await
    }

    /// Record watched episodes; reaching a known total completes the entry
    pub async fn set_progress(&self, id: &str, new_ep: i64, total_ep: u32) -> AppResult<LibraryEntry> {
        let existing = self.require(id).await?;
        let mut entry = existing.clone();
        entry.apply_progress(new_ep, total_ep);
        self.persist(entry, Some(&existing)).await
    }

    /// Change status; completing with a known total fills progress
    pub async fn set_status(
        &self,
        id: &str,
        status: WatchStatus,
        total_ep: Option<u32>,
    ) -> AppResult<LibraryEntry> {
        let existing = self.require(id).await?;
        let mut entry = existing.clone();
        entry.apply_status(status, total_ep);
        self.persist(entry, Some(&existing)).await
    }

    /// Personal rating, capped at 10; 0 clears it
    pub async fn set_score(&self, id: &str, score: u8) -> AppResult<LibraryEntry> {
        let existing = self.require(id).await?;
        let mut entry = existing.clone();
        entry.set_score(score);
        self.persist(entry, Some(&existing)).await
    }

    /// Toggle the favorite flag.
    ///
    /// When the entry is not stored yet and `catalog` is given, the entry is
    /// created first and flagged in a second write. The cap is checked
    /// before either write, so a rejected favorite leaves no trace.
    pub async fn set_favorite(
        &self,
        id: &str,
        flag: bool,
        catalog: Option<CatalogPayload>,
    ) -> AppResult<LibraryEntry> {
        let stored = self.repo.get(id).await?;

        if let Some(entry) = &stored {
            if entry.is_favorite == flag {
                return Ok(entry.clone());
            }
        }

        if flag {
            validate_favorite_cap(self.repo.count_favorites().await?, self.max_favorites)?;
        }

        let existing = match (stored, catalog) {
            (Some(entry), _) => entry,
            (None, Some(mut payload)) if flag => {
                match EntryInput::Catalog(payload.clone()).key() {
                    Some(key) if key != id => {
                        return Err(DomainError::InvariantViolation(format!(
                            "catalog item {} does not match entry {}",
                            key, id
                        ))
                        .into());
                    }
                    Some(_) => {}
                    None => payload.id = Some(RawId::Text(id.to_string())),
                }
                self.add_from_catalog(payload, None).await?
            }
            _ => return Err(AppError::NotFound),
        };

        let mut entry = existing.clone();
        entry.is_favorite = flag;
        self.persist(entry, Some(&existing)).await
    }

    /// Remove an entry. Removing an unknown id is not an error.
    pub async fn remove(&self, id: &str) -> AppResult<bool> {
        let removed = self.repo.delete(id).await?;
        if removed {
            self.event_bus.emit(LibraryEntryRemoved::new(id.to_string()));
        } else {
            debug!("Remove of unknown entry {} ignored", id);
        }
        Ok(removed)
    }

    // ========================================================================
    // BATCH WRITE PATHS
    // ========================================================================

    /// Merge fresh catalog metadata into an entry that is still stored.
    /// Fails with `NotFound` when the entry was removed in the meantime.
    pub async fn refresh_metadata(
        &self,
        id: &str,
        payload: CatalogPayload,
    ) -> AppResult<LibraryEntry> {
        let existing = self.require(id).await?;
        let mut entry = normalize(
            EntryInput::Catalog(payload),
            Some(&existing),
            Some(existing.status),
        )?;
        // Enrichment never re-keys an entry
        entry.id = existing.id.clone();
        self.persist(entry, Some(&existing)).await
    }

    /// Write one imported record.
    ///
    /// With `overwrite` the record replaces the stored fields it carries;
    /// without it the stored entry wins wherever the record is silent. A
    /// favorite flag that would break the cap is dropped and the entry is
    /// still written.
    pub async fn write_imported(&self, record: ImportRecord, overwrite: bool) -> AppResult<LibraryEntry> {
        let existing = self.repo.get(&record.id).await?;

        let mut entry = if overwrite {
            let mut entry = normalize(EntryInput::Import(record), None, None)?;
            if let Some(stored) = &existing {
                entry.synopsis = entry.synopsis.or_else(|| stored.synopsis.clone());
            }
            entry
        } else {
            normalize(EntryInput::Import(record), existing.as_ref(), None)?
        };

        match self.persist(entry.clone(), existing.as_ref()).await {
            Err(AppError::FavoriteLimitExceeded { max }) => {
                warn!(
                    "Favorite flag on imported entry {} dropped, limit of {} reached",
                    entry.id, max
                );
                entry.is_favorite = false;
                self.persist(entry, existing.as_ref()).await
            }
            other => other,
        }
    }

    // ========================================================================
    // INTERNALS
    // ========================================================================

    async fn require(&self, id: &str) -> AppResult<LibraryEntry> {
        self.repo.get(id).await?.ok_or(AppError::NotFound)
    }

    /// Stamp, validate and write. Newly set favorites go through the
    /// capped write so the count and the write happen together.
    async fn persist(
        &self,
        mut entry: LibraryEntry,
        previous: Option<&LibraryEntry>,
    ) -> AppResult<LibraryEntry> {
        entry.touch(Utc::now());
        validate_library_entry(&entry)?;

        let was_favorite = previous.map(|p| p.is_favorite).unwrap_or(false);
        if entry.is_favorite && !was_favorite {
            self.repo
                .save_within_favorite_cap(&entry, self.max_favorites)
                .await?;
        } else {
            self.repo.save(&entry).await?;
        }

        self.event_bus
            .emit(LibraryEntryUpserted::new(entry.id.clone(), entry.status));
        if entry.is_favorite != was_favorite {
            self.event_bus
                .emit(FavoriteChanged::new(entry.id.clone(), entry.is_favorite));
        }
        Ok(entry)
    }
}
