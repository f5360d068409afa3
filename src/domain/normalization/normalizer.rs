// Entry Normalizer
//
// Pure mapping from every accepted input shape into a LibraryEntry.
//
// RULES:
// - No I/O, no clock: last_updated is carried over, the store stamps it
// - User-owned fields (score, favorite, progress, status) are never reset
//   by metadata-only inputs
// - The result always satisfies the per-entry invariants

use super::input::{CatalogPayload, EntryInput, ImportRecord, TagRef};
use crate::domain::library_entry::entity::dedupe_tags;
use crate::domain::library_entry::{LibraryEntry, WatchStatus, MAX_SCORE};
use crate::domain::{DomainError, DomainResult};

/// Preferred image formats, best first
const IMAGE_FORMATS: [&str; 2] = ["jpg", "webp"];

/// Map `input` into a canonical entry, merging with the `existing` stored
/// entry when there is one.
///
/// `status_override` wins over every other status source. Completing through
/// the override fills progress up to the known total.
pub fn normalize(
    input: EntryInput,
    existing: Option<&LibraryEntry>,
    status_override: Option<WatchStatus>,
) -> DomainResult<LibraryEntry> {
    let mut entry = match input {
        EntryInput::Catalog(payload) => from_catalog(payload, existing)?,
        EntryInput::Stored(candidate) => from_stored(candidate, existing)?,
        EntryInput::Import(record) => from_import(record, existing)?,
    };

    if let Some(status) = status_override {
        entry.status = status;
        if status == WatchStatus::Completed {
            let watched = existing.map(|e| e.current_ep).unwrap_or(entry.current_ep);
            entry.current_ep = watched.max(entry.total_ep);
        }
    }

    entry.last_updated = existing.and_then(|e| e.last_updated).or(entry.last_updated);
    entry.enforce_invariants();
    Ok(entry)
}

/// Catalog payloads carry metadata only. User state comes from `existing`.
fn from_catalog(payload: CatalogPayload, existing: Option<&LibraryEntry>) -> DomainResult<LibraryEntry> {
    let id = payload
        .mal_id
        .clone()
        .and_then(|raw| raw.into_key())
        .or_else(|| payload.id.clone().and_then(|raw| raw.into_key()))
        .or_else(|| existing.map(|e| e.id.clone()));
    let title = non_blank(payload.title.clone()).or_else(|| existing.map(|e| e.title.clone()));
    let (id, title) = require_identity(id, title)?;

    let image = extract_image(&payload).or_else(|| existing.and_then(|e| e.image.clone()));
    let genres = extract_genres(&payload);

    let mut entry = LibraryEntry::new(id, title);
    entry.image = image;
    entry.total_ep = payload
        .episodes
        .or_else(|| existing.map(|e| e.total_ep))
        .unwrap_or(0);
    entry.genres = match genres {
        Some(genres) => genres,
        None => existing.map(|e| e.genres.clone()).unwrap_or_default(),
    };
    entry.studios = match payload.studios {
        Some(studios) => studios.into_iter().map(TagRef::into_name).collect(),
        None => existing.map(|e| e.studios.clone()).unwrap_or_default(),
    };
    entry.media_type = payload
        .media_type
        .or_else(|| existing.and_then(|e| e.media_type.clone()));
    entry.year = payload.year.or_else(|| existing.and_then(|e| e.year));
    entry.season = payload.season.or_else(|| existing.and_then(|e| e.season.clone()));
    entry.synopsis = non_blank(payload.synopsis).or_else(|| existing.and_then(|e| e.synopsis.clone()));

    carry_user_state(&mut entry, existing);
    Ok(entry)
}

/// A flat candidate. When the entry is already stored, the stored user
/// state stays authoritative and only metadata is taken from the candidate.
fn from_stored(candidate: LibraryEntry, existing: Option<&LibraryEntry>) -> DomainResult<LibraryEntry> {
    let (id, title) = require_identity(
        non_blank(Some(candidate.id.clone())),
        non_blank(Some(candidate.title.clone())).or_else(|| existing.map(|e| e.title.clone())),
    )?;

    let mut entry = LibraryEntry { id, title, ..candidate };
    if let Some(existing) = existing {
        entry.image = entry.image.or_else(|| existing.image.clone());
        entry.synopsis = entry.synopsis.or_else(|| existing.synopsis.clone());
        if entry.total_ep == 0 {
            entry.total_ep = existing.total_ep;
        }
        carry_user_state(&mut entry, Some(existing));
    }
    Ok(entry)
}

/// Import records override field by field; whatever the record leaves out
/// falls back to `existing` and then to defaults.
fn from_import(record: ImportRecord, existing: Option<&LibraryEntry>) -> DomainResult<LibraryEntry> {
    let (id, title) = require_identity(
        non_blank(Some(record.id.clone())),
        non_blank(Some(record.title.clone())).or_else(|| existing.map(|e| e.title.clone())),
    )?;

    let mut entry = LibraryEntry::new(id, title);
    entry.status = WatchStatus::from_token(&record.status)
        .or_else(|| existing.map(|e| e.status))
        .unwrap_or_default();
    entry.image = non_blank(record.image).or_else(|| existing.and_then(|e| e.image.clone()));
    entry.score = record
        .score
        .map(|s| s.clamp(0, i64::from(MAX_SCORE)) as u8)
        .or_else(|| existing.map(|e| e.score))
        .unwrap_or(0);
    entry.current_ep = record
        .current_ep
        .map(clamp_count)
        .or_else(|| existing.map(|e| e.current_ep))
        .unwrap_or(0);
    entry.total_ep = record
        .total_ep
        .map(clamp_count)
        .or_else(|| existing.map(|e| e.total_ep))
        .unwrap_or(0);
    entry.is_favorite = record
        .is_favorite
        .or_else(|| existing.map(|e| e.is_favorite))
        .unwrap_or(false);
    entry.genres = record
        .genres
        .or_else(|| existing.map(|e| e.genres.clone()))
        .unwrap_or_default();
    entry.studios = record
        .studios
        .or_else(|| existing.map(|e| e.studios.clone()))
        .unwrap_or_default();
    entry.media_type = record
        .media_type
        .or_else(|| existing.and_then(|e| e.media_type.clone()));
    entry.year = record.year.or_else(|| existing.and_then(|e| e.year));
    entry.season = record.season.or_else(|| existing.and_then(|e| e.season.clone()));
    entry.synopsis = existing.and_then(|e| e.synopsis.clone());
    Ok(entry)
}

fn carry_user_state(entry: &mut LibraryEntry, existing: Option<&LibraryEntry>) {
    if let Some(existing) = existing {
        entry.score = existing.score;
        entry.is_favorite = existing.is_favorite;
        entry.current_ep = existing.current_ep;
        entry.status = existing.status;
    }
}

fn require_identity(id: Option<String>, title: Option<String>) -> DomainResult<(String, String)> {
    match (id, title) {
        (Some(id), Some(title)) => Ok((id, title)),
        (None, None) => Err(DomainError::Normalization(
            "input has neither id nor title".to_string(),
        )),
        (None, Some(title)) => Err(DomainError::Normalization(format!(
            "\"{}\" has no catalog id",
            title
        ))),
        (Some(id), None) => Err(DomainError::Normalization(format!("{} has no title", id))),
    }
}

/// Flat `image` first, then the largest nested variant
fn extract_image(payload: &CatalogPayload) -> Option<String> {
    if let Some(image) = non_blank(payload.image.clone()) {
        return Some(image);
    }
    let images = payload.images.as_ref()?;
    IMAGE_FORMATS
        .iter()
        .filter_map(|format| images.get(*format))
        .chain(images.iter().filter(|(k, _)| !IMAGE_FORMATS.contains(&k.as_str())).map(|(_, v)| v))
        .find_map(|variants| variants.largest().map(str::to_string))
}

/// Genres with themes and demographics folded in.
/// `None` when the payload carried none of the three lists.
fn extract_genres(payload: &CatalogPayload) -> Option<Vec<String>> {
    if payload.genres.is_none() && payload.themes.is_none() && payload.demographics.is_none() {
        return None;
    }
    let tags = [&payload.genres, &payload.themes, &payload.demographics]
        .into_iter()
        .flatten()
        .flat_map(|list| list.iter().cloned().map(TagRef::into_name));
    Some(dedupe_tags(tags))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn clamp_count(value: i64) -> u32 {
    value.clamp(0, i64::from(u32::MAX)) as u32
}
