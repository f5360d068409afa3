// src/application/state.rs
//
// Session container: builds and owns every service of one library.
// Nothing here is global; callers hold the session and pass it around.

use std::sync::Arc;

use log::info;

use crate::config::SyncConfig;
use crate::db::{
    create_connection_pool, get_connection, get_database_path, initialize_database,
    verify_database_integrity,
};
use crate::events::EventBus;
use crate::error::AppResult;
use crate::integrations::{CatalogSource, JikanClient};
use crate::repositories::{InMemoryLibraryRepository, LibraryRepository, SqliteLibraryRepository};
use crate::services::{EnrichmentQueue, ImportCommitter, LibraryStore};

pub struct SyncSession {
    pub config: SyncConfig,
    pub event_bus: Arc<EventBus>,
    pub store: Arc<LibraryStore>,
    pub enrichment: Arc<EnrichmentQueue>,
    pub importer: Arc<ImportCommitter>,
}

impl SyncSession {
    /// Session over the SQLite library and the live catalog API
    pub fn open(config: SyncConfig) -> AppResult<Self> {
        config.validate()?;

        // 1. INFRASTRUCTURE
        let db_path = match &config.database_path {
            Some(path) => path.clone(),
            None => get_database_path()?,
        };
        let pool = Arc::new(create_connection_pool(&db_path)?);
        {
            let conn = get_connection(&pool)?;
            let applied = initialize_database(&conn)?;
            verify_database_integrity(&conn)?;
            info!(
                "Library database at {} ({} migrations applied)",
                db_path.display(),
                applied
            );
        }

        // 2. REPOSITORIES
        let repo: Arc<dyn LibraryRepository> = Arc::new(SqliteLibraryRepository::new(pool)?);
        let catalog: Arc<dyn CatalogSource> = Arc::new(JikanClient::new(&config.catalog)?);

        Ok(Self::from_parts(config, repo, catalog))
    }

    /// Session whose library lives only in memory
    pub fn in_memory(config: SyncConfig) -> AppResult<Self> {
        config.validate()?;
        let catalog: Arc<dyn CatalogSource> = Arc::new(JikanClient::new(&config.catalog)?);
        Ok(Self::from_parts(
            config,
            Arc::new(InMemoryLibraryRepository::new()),
            catalog,
        ))
    }

    /// Wire the services over given collaborators
    pub fn from_parts(
        config: SyncConfig,
        repo: Arc<dyn LibraryRepository>,
        catalog: Arc<dyn CatalogSource>,
    ) -> Self {
        // 3. SERVICES
        let event_bus = Arc::new(EventBus::new());
        let store = Arc::new(LibraryStore::new(
            repo,
            Arc::clone(&event_bus),
            config.max_favorites,
        ));
        let enrichment = Arc::new(EnrichmentQueue::new(
            catalog,
            Arc::clone(&store),
            Arc::clone(&event_bus),
            config.enrichment.clone(),
        ));
        let importer = Arc::new(ImportCommitter::new(
            Arc::clone(&store),
            Arc::clone(&enrichment),
            Arc::clone(&event_bus),
        ));

        Self {
            config,
            event_bus,
            store,
            enrichment,
            importer,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::WatchStatus;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_open_persists_across_sessions() {
        let dir = TempDir::new().unwrap();
        let config = SyncConfig {
            database_path: Some(dir.path().join("library.db")),
            ..SyncConfig::default()
        };

        {
            let session = SyncSession::open(config.clone()).unwrap();
            let record = crate::domain::ImportRecord {
                id: "1".to_string(),
                title: "Cowboy Bebop".to_string(),
                status: "watching".to_string(),
                image: Some("https://cdn.example/1.jpg".to_string()),
                ..Default::default()
            };
            session.store.write_imported(record, false).await.unwrap();
        }

        let reopened = SyncSession::open(config).unwrap();
        let entry = reopened.store.get("1").await.unwrap().unwrap();
        assert_eq!(entry.status, WatchStatus::Watching);
        assert_eq!(reopened.store.subscribe().borrow().len(), 1);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = SyncConfig {
            max_favorites: 0,
            ..SyncConfig::default()
        };
        assert!(SyncSession::in_memory(config).is_err());
    }
}
