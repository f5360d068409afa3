// src/repositories/library_repository.rs
//
// Library persistence: one keyed document per entry.
//
// CRITICAL RULES:
// - Repositories are DUMB data mappers
// - The only rule enforced here is the favorite cap, because the count and
//   the write must happen in one atomic step
// - Every successful write is folded into the live snapshot

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};
use tokio::sync::{watch, Mutex};

use crate::db::{get_connection, ConnectionPool};
use crate::domain::{LibraryEntry, WatchStatus};
use crate::error::{AppError, AppResult};

/// Every entry of the collection at one point in time
pub type LibrarySnapshot = Arc<Vec<LibraryEntry>>;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LibraryRepository: Send + Sync {
    async fn get(&self, id: &str) -> AppResult<Option<LibraryEntry>>;
    async fn list_all(&self) -> AppResult<Vec<LibraryEntry>>;
    async fn exists(&self, id: &str) -> AppResult<bool>;
    async fn count_favorites(&self) -> AppResult<usize>;
    /// Insert or fully replace the document keyed by `entry.id`
    async fn save(&self, entry: &LibraryEntry) -> AppResult<()>;
    /// Like `save`, but fails with `FavoriteLimitExceeded` when the write
    /// would leave more than `max_favorites` favorites. Count and write are
    /// atomic with respect to other writers of the same collection.
    async fn save_within_favorite_cap(
        &self,
        entry: &LibraryEntry,
        max_favorites: usize,
    ) -> AppResult<()>;
    /// Returns whether a document was removed
    async fn delete(&self, id: &str) -> AppResult<bool>;
    /// Live view of the collection, updated after every write
    fn subscribe(&self) -> watch::Receiver<LibrarySnapshot>;
}

const SELECT_COLUMNS: &str = "SELECT id, title, image, total_ep, current_ep, score, status,
        genres, studios, media_type, year, season, synopsis, is_favorite, last_updated
     FROM library_entries";

pub struct SqliteLibraryRepository {
    pool: Arc<ConnectionPool>,
    changes: watch::Sender<LibrarySnapshot>,
    /// Held across a write and its snapshot update so snapshots follow commit order
    write_lock: Mutex<()>,
}

impl SqliteLibraryRepository {
    /// Open the repository and load the initial snapshot
    pub fn new(pool: Arc<ConnectionPool>) -> AppResult<Self> {
        let initial = {
            let conn = get_connection(&pool)?;
            load_all(&conn)?
        };
        let (changes, _) = watch::channel(Arc::new(initial));
        Ok(Self {
            pool,
            changes,
            write_lock: Mutex::new(()),
        })
    }

    /// Run `op` on a pooled connection off the async runtime
    async fn run<T, F>(&self, op: F) -> AppResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> AppResult<T> + Send + 'static,
    {
        let pool = Arc::clone(&self.pool);
        tokio::task::spawn_blocking(move || {
            let mut conn = get_connection(&pool)?;
            op(&mut conn)
        })
        .await?
    }

    /// Fold one written entry into the live snapshot
    fn publish_saved(&self, entry: LibraryEntry) {
        self.changes.send_modify(|snapshot| {
            let mut entries = (**snapshot).clone();
            entries.retain(|e| e.id != entry.id);
            let at = entries.partition_point(|e| snapshot_order(e) < snapshot_order(&entry));
            entries.insert(at, entry);
            *snapshot = Arc::new(entries);
        });
    }

    fn publish_removed(&self, id: &str) {
        self.changes.send_modify(|snapshot| {
            let mut entries = (**snapshot).clone();
            entries.retain(|e| e.id != id);
            *snapshot = Arc::new(entries);
        });
    }

    /// Map database row to LibraryEntry - returns rusqlite::Error for query_map compatibility
    fn row_to_entry(row: &Row) -> Result<LibraryEntry, rusqlite::Error> {
        let status_str: String = row.get("status")?;
        let status = WatchStatus::from_token(&status_str).ok_or(rusqlite::Error::InvalidQuery)?;

        let genres_json: String = row.get("genres")?;
        let genres: Vec<String> = serde_json::from_str(&genres_json)
            .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;

        let studios_json: String = row.get("studios")?;
        let studios: Vec<String> = serde_json::from_str(&studios_json)
            .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;

        let last_updated_str: String = row.get("last_updated")?;
        let last_updated = DateTime::parse_from_rfc3339(&last_updated_str)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;

        let total_ep: i64 = row.get("total_ep")?;
        let current_ep: i64 = row.get("current_ep")?;
        let score: i64 = row.get("score")?;

        Ok(LibraryEntry {
            id: row.get("id")?,
            title: row.get("title")?,
            image: row.get("image")?,
            total_ep: total_ep as u32,
            current_ep: current_ep as u32,
            score: score as u8,
            status,
            genres,
            studios,
            media_type: row.get("media_type")?,
            year: row.get("year")?,
            season: row.get("season")?,
            synopsis: row.get("synopsis")?,
            is_favorite: row.get("is_favorite")?,
            last_updated: Some(last_updated),
        })
    }
}

/// Snapshots are ordered by title, then id
fn snapshot_order(entry: &LibraryEntry) -> (&str, &str) {
    (entry.title.as_str(), entry.id.as_str())
}

fn load_all(conn: &Connection) -> AppResult<Vec<LibraryEntry>> {
    let mut stmt = conn.prepare(&format!("{} ORDER BY title, id", SELECT_COLUMNS))?;
    let entries = stmt
        .query_map([], SqliteLibraryRepository::row_to_entry)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(entries)
}

fn count_favorites_excluding(conn: &Connection, id: &str) -> AppResult<usize> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM library_entries WHERE is_favorite = 1 AND id != ?1",
        params![id],
        |row| row.get(0),
    )?;
    Ok(count as usize)
}

/// Copy of `entry` carrying the timestamp the row will be written with
fn stamped(entry: &LibraryEntry) -> LibraryEntry {
    let mut entry = entry.clone();
    entry.last_updated.get_or_insert_with(Utc::now);
    entry
}

fn write_entry(conn: &Connection, entry: &LibraryEntry) -> AppResult<()> {
    let genres_json = serde_json::to_string(&entry.genres)?;
    let studios_json = serde_json::to_string(&entry.studios)?;
    let last_updated = entry.last_updated.unwrap_or_else(Utc::now);

    conn.execute(
        "INSERT OR REPLACE INTO library_entries (
            id, title, image, total_ep, current_ep, score, status,
            genres, studios, media_type, year, season, synopsis, is_favorite, last_updated
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
        params![
            entry.id,
            entry.title,
            entry.image,
            i64::from(entry.total_ep),
            i64::from(entry.current_ep),
            i64::from(entry.score),
            entry.status.as_str(),
            genres_json,
            studios_json,
            entry.media_type,
            entry.year,
            entry.season,
            entry.synopsis,
            entry.is_favorite,
            last_updated.to_rfc3339(),
        ],
    )?;
    Ok(())
}

fn store_write_error(err: AppError) -> AppError {
    match err {
        AppError::FavoriteLimitExceeded { .. } | AppError::StoreWrite(_) => err,
        other => AppError::StoreWrite(other.to_string()),
    }
}

#[async_trait]
impl LibraryRepository for SqliteLibraryRepository {
    async fn get(&self, id: &str) -> AppResult<Option<LibraryEntry>> {
        let id = id.to_string();
        self.run(move |conn| {
            let mut stmt = conn.prepare(&format!("{} WHERE id = ?1", SELECT_COLUMNS))?;
            let entry = stmt
                .query_row(params![id], Self::row_to_entry)
                .optional()?;
            Ok(entry)
        })
        .await
    }

    async fn list_all(&self) -> AppResult<Vec<LibraryEntry>> {
        self.run(|conn| load_all(conn)).await
    }

    async fn exists(&self, id: &str) -> AppResult<bool> {
        let id = id.to_string();
        self.run(move |conn| {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM library_entries WHERE id = ?1",
                params![id],
                |row| row.get(0),
            )?;
            Ok(count > 0)
        })
        .await
    }

    async fn count_favorites(&self) -> AppResult<usize> {
        self.run(|conn| {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM library_entries WHERE is_favorite = 1",
                [],
                |row| row.get(0),
            )?;
            Ok(count as usize)
        })
        .await
    }

    async fn save(&self, entry: &LibraryEntry) -> AppResult<()> {
        let _guard = self.write_lock.lock().await;
        let entry = stamped(entry);
        let written = entry.clone();
        self.run(move |conn| write_entry(conn, &written))
            .await
            .map_err(store_write_error)?;
        self.publish_saved(entry);
        Ok(())
    }

    async fn save_within_favorite_cap(
        &self,
        entry: &LibraryEntry,
        max_favorites: usize,
    ) -> AppResult<()> {
        let _guard = self.write_lock.lock().await;
        let entry = stamped(entry);
        let written = entry.clone();
        self.run(move |conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            if written.is_favorite && count_favorites_excluding(&tx, &written.id)? >= max_favorites {
                return Err(AppError::FavoriteLimitExceeded { max: max_favorites });
            }
            write_entry(&tx, &written)?;
            tx.commit()?;
            Ok(())
        })
        .await
        .map_err(store_write_error)?;
        self.publish_saved(entry);
        Ok(())
    }

    async fn delete(&self, id: &str) -> AppResult<bool> {
        let _guard = self.write_lock.lock().await;
        let key = id.to_string();
        let removed = self
            .run(move |conn| {
                let rows = conn.execute("DELETE FROM library_entries WHERE id = ?1", params![key])?;
                Ok(rows > 0)
            })
            .await
            .map_err(store_write_error)?;
        if removed {
            self.publish_removed(id);
        }
        Ok(removed)
    }

    fn subscribe(&self) -> watch::Receiver<LibrarySnapshot> {
        self.changes.subscribe()
    }
}
