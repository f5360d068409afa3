// src/application/commands/backup_commands.rs
//
// Backup and resync Command Handlers
//
// RULES:
// - File-level failures surface before any write
// - Batch commands return their report, per-item failures included

use std::path::PathBuf;

use log::info;
use tokio_util::sync::CancellationToken;

use crate::application::error_handling::ToErrorResponse;
use crate::application::state::SyncSession;
use crate::error::AppResult;
use crate::infrastructure::{read_import_file, write_export_file};
use crate::services::{EnrichmentReport, ImportReport, ProgressFn};

/// Import a `.json` backup or a foreign `.xml` export
pub async fn import_backup_file(
    session: &SyncSession,
    path: PathBuf,
    overwrite: bool,
    on_progress: Option<&ProgressFn<'_>>,
    cancel: &CancellationToken,
) -> Result<ImportReport, String> {
    run_import(session, path, overwrite, on_progress, cancel)
        .await
        .to_error_response()
}

/// Export the library as `.json` or `.csv`. Returns the number of entries written.
pub async fn export_backup_file(session: &SyncSession, path: PathBuf) -> Result<usize, String> {
    async {
        let entries = session.store.list().await?;
        write_export_file(&path, &entries).await?;
        AppResult::Ok(entries.len())
    }
    .await
    .to_error_response()
}

/// Refresh every entry that still lacks catalog metadata
pub async fn resync_library(
    session: &SyncSession,
    on_progress: Option<&ProgressFn<'_>>,
    cancel: &CancellationToken,
) -> Result<EnrichmentReport, String> {
    session
        .enrichment
        .resync_stale(on_progress, cancel)
        .await
        .to_error_response()
}

async fn run_import(
    session: &SyncSession,
    path: PathBuf,
    overwrite: bool,
    on_progress: Option<&ProgressFn<'_>>,
    cancel: &CancellationToken,
) -> AppResult<ImportReport> {
    let candidates = read_import_file(&path).await?;
    info!("Importing {} records from {}", candidates.len(), path.display());
    session
        .importer
        .commit_import(candidates, overwrite, on_progress, cancel)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::application::ErrorResponse;
    use crate::application::ErrorType;
    use crate::config::{EnrichmentConfig, SyncConfig};
    use crate::domain::{LibraryEntry, WatchStatus};
    use crate::integrations::MockCatalogSource;
    use crate::repositories::InMemoryLibraryRepository;
    use tempfile::TempDir;

    fn session_with(entries: Vec<LibraryEntry>) -> SyncSession {
        let mut catalog = MockCatalogSource::new();
        catalog.expect_fetch_anime().returning(|id| {
            Err(crate::error::AppError::RateLimited { id: id.to_string() })
        });
        let config = SyncConfig {
            enrichment: EnrichmentConfig::immediate(3),
            ..SyncConfig::default()
        };
        SyncSession::from_parts(
            config,
            Arc::new(InMemoryLibraryRepository::with_entries(entries)),
            Arc::new(catalog),
        )
    }

    fn watched(id: &str, title: &str) -> LibraryEntry {
        let mut entry = LibraryEntry::new(id, title);
        entry.status = WatchStatus::Watching;
        entry.total_ep = 12;
        entry.current_ep = 4;
        entry.score = 7;
        entry.image = Some(format!("https://cdn.example/{}.jpg", id));
        entry
    }

    #[tokio::test]
    async fn test_export_then_import_into_new_session() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("animehub-backup.json");

        let source = session_with(vec![watched("1", "A"), watched("2", "B")]);
        assert_eq!(export_backup_file(&source, path.clone()).await.unwrap(), 2);

        let target = session_with(vec![]);
        let report = import_backup_file(&target, path, false, None, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(report.available, 2);
        assert_eq!(report.written, 2);
        let copy = target.store.get("2").await.unwrap().unwrap();
        assert_eq!(copy.current_ep, 4);
        assert_eq!(copy.score, 7);
    }

    #[tokio::test]
    async fn test_unusable_file_fails_before_writes() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{ definitely not json").unwrap();

        let session = session_with(vec![]);
        let err = import_backup_file(&session, path, true, None, &CancellationToken::new())
            .await
            .unwrap_err();

        let response: ErrorResponse = serde_json::from_str(&err).unwrap();
        assert_eq!(response.error_type, ErrorType::InvalidFile);
        assert!(session.store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_resync_reports_rate_limited_items() {
        let session = session_with(vec![watched("1", "A")]);
        let report = resync_library(&session, None, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(report.total, 1);
        assert_eq!(report.refreshed, 0);
        assert_eq!(report.failed.len(), 1);
    }
}
