// src/services/enrichment_queue.rs
//
// Enrichment Queue - rate-limited catalog refresh
//
// ARCHITECTURE:
// - Batches of `concurrency` requests run together, batches run in order
// - A fixed pause separates batches to stay under the aggregate rate limit
// - Per-item failures are logged and reported, never raised
// - Merges go through LibraryStore::refresh_metadata (user fields survive)

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use log::{info, warn};
use tokio_util::sync::CancellationToken;

use crate::config::EnrichmentConfig;
use crate::domain::{normalize, CatalogPayload, EntryInput, ImportRecord, LibraryEntry};
use crate::error::{AppError, AppResult};
use crate::events::{EnrichmentPassCompleted, EventBus};
use crate::integrations::CatalogSource;
use crate::services::library_store::LibraryStore;
use crate::services::progress::{EnrichmentReport, ItemFailure, ProgressFn, ProgressTracker};

pub struct EnrichmentQueue {
    catalog: Arc<dyn CatalogSource>,
    store: Arc<LibraryStore>,
    event_bus: Arc<EventBus>,
    config: EnrichmentConfig,
}

impl EnrichmentQueue {
    pub fn new(
        catalog: Arc<dyn CatalogSource>,
        store: Arc<LibraryStore>,
        event_bus: Arc<EventBus>,
        config: EnrichmentConfig,
    ) -> Self {
        Self {
            catalog,
            store,
            event_bus,
            config,
        }
    }

    pub fn config(&self) -> &EnrichmentConfig {
        &self.config
    }

    /// Refresh catalog metadata for `entries`.
    ///
    /// Progress advances by the batch width after each batch, failures
    /// included, so a pass with partial failures still reaches 100%.
    /// Cancellation is honored between batches; a batch in flight finishes.
    pub async fn enrich(
        &self,
        entries: Vec<LibraryEntry>,
        on_progress: Option<&ProgressFn<'_>>,
        cancel: &CancellationToken,
    ) -> EnrichmentReport {
        let total = entries.len();
        let width = self.config.concurrency.max(1);
        let mut tracker = ProgressTracker::new(total, on_progress);
        let mut report = EnrichmentReport {
            total,
            ..EnrichmentReport::default()
        };

        info!("Enrichment started: {} entries, batch width {}", total, width);

        for (index, batch) in entries.chunks(width).enumerate() {
            if index > 0 && !pause(self.config.batch_delay(), cancel).await {
                report.cancelled = true;
                break;
            }
            if cancel.is_cancelled() {
                report.cancelled = true;
                break;
            }

            let results = join_all(batch.iter().map(|entry| self.refresh_one(&entry.id))).await;

            for (entry, result) in batch.iter().zip(results) {
                match result {
                    Ok(_) => report.refreshed += 1,
                    Err(e) => {
                        warn!("Enrichment of {} skipped: {}", entry.id, e);
                        report.failed.push(ItemFailure::new(entry.id.clone(), &e));
                    }
                }
            }
            tracker.advance(batch.len());
        }

        info!(
            "Enrichment finished: {} refreshed, {} failed{}",
            report.refreshed,
            report.failed.len(),
            if report.cancelled { " (cancelled)" } else { "" }
        );
        self.event_bus.emit(EnrichmentPassCompleted::new(
            report.total,
            report.refreshed,
            report.failed.len(),
            report.cancelled,
        ));
        report
    }

    /// Enrich every stored entry that still lacks catalog metadata
    pub async fn resync_stale(
        &self,
        on_progress: Option<&ProgressFn<'_>>,
        cancel: &CancellationToken,
    ) -> AppResult<EnrichmentReport> {
        let stale: Vec<LibraryEntry> = self
            .store
            .list()
            .await?
            .into_iter()
            .filter(LibraryEntry::needs_enrichment)
            .collect();

        Ok(self.enrich(stale, on_progress, cancel).await)
    }

    /// Fetch one catalog item for a detail view; aborts when `cancel` fires
    pub async fn fetch_detail(&self, id: &str, cancel: &CancellationToken) -> AppResult<CatalogPayload> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(AppError::Cancelled),
            result = self.catalog.fetch_anime(id) => result,
        }
    }

    /// Fill the metadata an import record is missing from the catalog.
    /// Fields the record already carries are left alone.
    pub async fn backfill(&self, record: &mut ImportRecord) -> AppResult<()> {
        let payload = self.catalog.fetch_anime(&record.id).await?;
        let fresh = normalize(EntryInput::Catalog(payload), None, None)?;

        if record.image.is_none() {
            record.image = fresh.image;
        }
        if record.genres.as_ref().map_or(true, Vec::is_empty) {
            record.genres = Some(fresh.genres);
        }
        if record.studios.as_ref().map_or(true, Vec::is_empty) {
            record.studios = Some(fresh.studios);
        }
        if record.total_ep.map_or(true, |t| t <= 0) && fresh.total_ep > 0 {
            record.total_ep = Some(i64::from(fresh.total_ep));
        }
        record.year = record.year.or(fresh.year);
        record.media_type = record.media_type.take().or(fresh.media_type);
        record.season = record.season.take().or(fresh.season);
        Ok(())
    }

    async fn refresh_one(&self, id: &str) -> AppResult<LibraryEntry> {
        let payload = self.catalog.fetch_anime(id).await?;
        self.store.refresh_metadata(id, payload).await
    }
}

/// Sleep for `delay` unless cancelled first. Returns false on cancellation.
pub(crate) async fn pause(delay: Duration, cancel: &CancellationToken) -> bool {
    if delay.is_zero() {
        return !cancel.is_cancelled();
    }
    tokio::select! {
        _ = cancel.cancelled() => false,
        _ = tokio::time::sleep(delay) => true,
    }
}
