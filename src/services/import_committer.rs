// src/services/import_committer.rs
//
// Import Committer - parsed records into the store
//
// FLOW:
// 1. Split candidates into to-process and skipped (already stored, no overwrite)
// 2. Report skipped records as done right away
// 3. For each record to process: backfill from the catalog when it has no
//    image (sequential, spaced by the import delay), then write it
// 4. One progress step per record, ending at done == total
//
// Only the split can fail the import. Once writing starts, per-record
// failures are logged and collected in the report.

use std::sync::Arc;

use log::{info, warn};
use tokio_util::sync::CancellationToken;

use crate::domain::ImportRecord;
use crate::error::AppResult;
use crate::events::{EventBus, ImportCommitted};
use crate::services::enrichment_queue::{pause, EnrichmentQueue};
use crate::services::library_store::LibraryStore;
use crate::services::progress::{ImportReport, ItemFailure, ProgressFn, ProgressTracker};

pub struct ImportCommitter {
    store: Arc<LibraryStore>,
    queue: Arc<EnrichmentQueue>,
    event_bus: Arc<EventBus>,
}

impl ImportCommitter {
    pub fn new(
        store: Arc<LibraryStore>,
        queue: Arc<EnrichmentQueue>,
        event_bus: Arc<EventBus>,
    ) -> Self {
        Self {
            store,
            queue,
            event_bus,
        }
    }

    pub async fn commit_import(
        &self,
        candidates: Vec<ImportRecord>,
        overwrite: bool,
        on_progress: Option<&ProgressFn<'_>>,
        cancel: &CancellationToken,
    ) -> AppResult<ImportReport> {
        let total = candidates.len();
        let mut tracker = ProgressTracker::new(total, on_progress);

        let mut to_process = Vec::with_capacity(total);
        let mut skipped = 0usize;
        for record in candidates {
            if !overwrite && self.store.contains(&record.id).await? {
                skipped += 1;
            } else {
                to_process.push(record);
            }
        }

        let mut report = ImportReport {
            total,
            available: to_process.len(),
            skipped,
            ..ImportReport::default()
        };
        info!(
            "Import started: {} records, {} to write, {} skipped, overwrite={}",
            total, report.available, skipped, overwrite
        );
        tracker.advance(skipped);

        let import_delay = self.queue.config().import_delay();
        let mut fetched_before = false;

        for mut record in to_process {
            if cancel.is_cancelled() {
                report.cancelled = true;
                break;
            }

            if record.image.is_none() {
                if fetched_before && !pause(import_delay, cancel).await {
                    report.cancelled = true;
                    break;
                }
                fetched_before = true;

                match self.queue.backfill(&mut record).await {
                    Ok(()) => report.backfilled += 1,
                    Err(e) => {
                        warn!("Backfill of {} failed, writing as is: {}", record.id, e);
                        report.backfill_failed += 1;
                    }
                }
            }

            let id = record.id.clone();
            match self.store.write_imported(record, overwrite).await {
                Ok(_) => report.written += 1,
                Err(e) => {
                    warn!("Import of {} failed: {}", id, e);
                    report.failed.push(ItemFailure::new(id, &e));
                }
            }
            tracker.advance(1);
        }

        info!(
            "Import finished: {} written, {} failed, {} backfilled{}",
            report.written,
            report.failed.len(),
            report.backfilled,
            if report.cancelled { " (cancelled)" } else { "" }
        );
        self.event_bus.emit(ImportCommitted::new(
            report.available,
            report.written,
            report.skipped,
            report.failed.len(),
            report.cancelled,
        ));
        Ok(report)
    }
}
