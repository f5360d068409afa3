// src/application/commands/library_commands.rs
//
// Library Command Handlers
//
// RULES:
// - One store call per command
// - Errors leave as serialized ErrorResponse

use crate::application::error_handling::{ErrorResponse, ToErrorResponse};
use crate::application::state::SyncSession;
use crate::domain::{CatalogPayload, LibraryEntry, WatchStatus};

/// List the whole library
pub async fn list_library(session: &SyncSession) -> Result<Vec<LibraryEntry>, String> {
    session.store.list().await.to_error_response()
}

/// Add a catalog item, optionally straight into a status
pub async fn add_to_library(
    session: &SyncSession,
    payload: CatalogPayload,
    status: Option<String>,
) -> Result<LibraryEntry, String> {
    let status = parse_status(status.as_deref())?;
    session
        .store
        .add_from_catalog(payload, status)
        .await
        .to_error_response()
}

pub async fn update_progress(
    session: &SyncSession,
    id: String,
    episode: i64,
    total_episodes: u32,
) -> Result<LibraryEntry, String> {
    session
        .store
        .set_progress(&id, episode, total_episodes)
        .await
        .to_error_response()
}

pub async fn update_status(
    session: &SyncSession,
    id: String,
    status: String,
    total_episodes: Option<u32>,
) -> Result<LibraryEntry, String> {
    let status = parse_status(Some(&status))?.unwrap_or_default();
    session
        .store
        .set_status(&id, status, total_episodes)
        .await
        .to_error_response()
}

pub async fn rate_entry(session: &SyncSession, id: String, score: u8) -> Result<LibraryEntry, String> {
    session.store.set_score(&id, score).await.to_error_response()
}

/// Favorite or unfavorite; `payload` lets an unknown catalog item be created
pub async fn toggle_favorite(
    session: &SyncSession,
    id: String,
    favorite: bool,
    payload: Option<CatalogPayload>,
) -> Result<LibraryEntry, String> {
    session
        .store
        .set_favorite(&id, favorite, payload)
        .await
        .to_error_response()
}

pub async fn remove_from_library(session: &SyncSession, id: String) -> Result<bool, String> {
    session.store.remove(&id).await.to_error_response()
}

fn parse_status(token: Option<&str>) -> Result<Option<WatchStatus>, String> {
    match token {
        None => Ok(None),
        Some(token) => WatchStatus::from_token(token).map(Some).ok_or_else(|| {
            let response = ErrorResponse::validation(format!("Unknown status: {}", token));
            serde_json::to_string(&response).unwrap_or_else(|_| "Internal error".to_string())
        }),
    }
}
