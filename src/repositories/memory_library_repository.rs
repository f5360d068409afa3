// src/repositories/memory_library_repository.rs
//
// Process-local library collection.
// Used for ephemeral sessions and as the store fake in tests.

use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use tokio::sync::watch;

use super::library_repository::{LibraryRepository, LibrarySnapshot};
use crate::domain::LibraryEntry;
use crate::error::{AppError, AppResult};

pub struct InMemoryLibraryRepository {
    entries: RwLock<HashMap<String, LibraryEntry>>,
    changes: watch::Sender<LibrarySnapshot>,
}

impl InMemoryLibraryRepository {
    pub fn new() -> Self {
        let (changes, _) = watch::channel(Arc::new(Vec::new()));
        Self {
            entries: RwLock::new(HashMap::new()),
            changes,
        }
    }

    /// Seed the collection without going through a service
    pub fn with_entries(entries: impl IntoIterator<Item = LibraryEntry>) -> Self {
        let repo = Self::new();
        if let Ok(mut map) = repo.entries.write() {
            map.extend(entries.into_iter().map(|e| (e.id.clone(), e)));
        }
        if let Ok(map) = repo.entries.read() {
            repo.changes.send_replace(Arc::new(sorted(&map)));
        }
        repo
    }

    fn read(&self) -> AppResult<RwLockReadGuard<'_, HashMap<String, LibraryEntry>>> {
        self.entries
            .read()
            .map_err(|_| AppError::StoreWrite("library lock poisoned".to_string()))
    }

    fn write(&self) -> AppResult<RwLockWriteGuard<'_, HashMap<String, LibraryEntry>>> {
        self.entries
            .write()
            .map_err(|_| AppError::StoreWrite("library lock poisoned".to_string()))
    }

    fn publish(&self, map: &HashMap<String, LibraryEntry>) {
        self.changes.send_replace(Arc::new(sorted(map)));
    }
}

impl Default for InMemoryLibraryRepository {
    fn default() -> Self {
        Self::new()
    }
}

fn sorted(map: &HashMap<String, LibraryEntry>) -> Vec<LibraryEntry> {
    let mut entries: Vec<LibraryEntry> = map.values().cloned().collect();
    entries.sort_by(|a, b| a.title.cmp(&b.title).then_with(|| a.id.cmp(&b.id)));
    entries
}

#[async_trait]
impl LibraryRepository for InMemoryLibraryRepository {
    async fn get(&self, id: &str) -> AppResult<Option<LibraryEntry>> {
        let map = self.read()?;
        Ok(map.get(id).cloned())
    }

    async fn list_all(&self) -> AppResult<Vec<LibraryEntry>> {
        let map = self.read()?;
        Ok(sorted(&map))
    }

    async fn exists(&self, id: &str) -> AppResult<bool> {
        let map = self.read()?;
        Ok(map.contains_key(id))
    }

    async fn count_favorites(&self) -> AppResult<usize> {
        let map = self.read()?;
        Ok(map.values().filter(|e| e.is_favorite).count())
    }

    async fn save(&self, entry: &LibraryEntry) -> AppResult<()> {
        let mut map = self.write()?;
        map.insert(entry.id.clone(), entry.clone());
        self.publish(&map);
        Ok(())
    }

    async fn save_within_favorite_cap(
        &self,
        entry: &LibraryEntry,
        max_favorites: usize,
    ) -> AppResult<()> {
        let mut map = self.write()?;
        if entry.is_favorite {
            let others = map
                .values()
                .filter(|e| e.is_favorite && e.id != entry.id)
                .count();
            if others >= max_favorites {
                return Err(AppError::FavoriteLimitExceeded { max: max_favorites });
            }
        }
        map.insert(entry.id.clone(), entry.clone());
        self.publish(&map);
        Ok(())
    }

    async fn delete(&self, id: &str) -> AppResult<bool> {
        let mut map = self.write()?;
        let removed = map.remove(id).is_some();
        if removed {
            self.publish(&map);
        }
        Ok(removed)
    }

    fn subscribe(&self) -> watch::Receiver<LibrarySnapshot> {
        self.changes.subscribe()
    }
}
