use super::entity::{LibraryEntry, WatchStatus, MAX_SCORE};
use crate::domain::{DomainError, DomainResult};

/// Validates all LibraryEntry invariants
/// These must hold after every store mutation
pub fn validate_library_entry(entry: &LibraryEntry) -> DomainResult<()> {
    validate_id(&entry.id)?;
    validate_progress(entry)?;
    validate_genres(&entry.genres)?;
    if entry.score > MAX_SCORE {
        return Err(DomainError::InvariantViolation(format!(
            "Score {} is above {}",
            entry.score, MAX_SCORE
        )));
    }
    Ok(())
}

/// Favorites are capped per collection
pub fn validate_favorite_cap(current_favorites: usize, max_favorites: usize) -> DomainResult<()> {
    if current_favorites >= max_favorites {
        return Err(DomainError::FavoriteLimitReached { max: max_favorites });
    }
    Ok(())
}

fn validate_id(id: &str) -> DomainResult<()> {
    if id.trim().is_empty() {
        return Err(DomainError::InvariantViolation(
            "Entry id cannot be empty".to_string(),
        ));
    }
    Ok(())
}

fn validate_progress(entry: &LibraryEntry) -> DomainResult<()> {
    if entry.total_ep == 0 {
        return Ok(());
    }
    if entry.current_ep > entry.total_ep {
        return Err(DomainError::ProgressExceedsTotal {
            current: entry.current_ep,
            total: entry.total_ep,
        });
    }
    if entry.status == WatchStatus::Completed && entry.current_ep != entry.total_ep {
        return Err(DomainError::InvariantViolation(format!(
            "Completed entry {} has {} of {} episodes",
            entry.id, entry.current_ep, entry.total_ep
        )));
    }
    Ok(())
}

fn validate_genres(genres: &[String]) -> DomainResult<()> {
    let mut seen = std::collections::HashSet::new();
    for genre in genres {
        if !seen.insert(genre.trim()) {
            return Err(DomainError::InvariantViolation(format!(
                "Duplicate genre: {}",
                genre
            )));
        }
    }
    Ok(())
}

/// Invariants that must hold true for the library domain:
///
/// 1. id is non-empty and unique per collection (unique is the store key)
/// 2. current_ep <= total_ep whenever total_ep is known
/// 3. completed entries with a known total have current_ep == total_ep
/// 4. genres hold no duplicates after trimming
/// 5. favorites never exceed the configured maximum
/// 6. last_updated is assigned by the store, never by callers

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_entry() {
        let entry = LibraryEntry::new("1", "Steins;Gate");
        assert!(validate_library_entry(&entry).is_ok());
    }

    #[test]
    fn test_empty_id_fails() {
        let entry = LibraryEntry::new("  ", "Steins;Gate");
        assert!(validate_library_entry(&entry).is_err());
    }

    #[test]
    fn test_progress_over_total_fails() {
        let mut entry = LibraryEntry::new("1", "Steins;Gate");
        entry.total_ep = 24;
        entry.current_ep = 25;
        assert!(matches!(
            validate_library_entry(&entry),
            Err(DomainError::ProgressExceedsTotal { current: 25, total: 24 })
        ));
    }

    #[test]
    fn test_incomplete_completed_entry_fails() {
        let mut entry = LibraryEntry::new("1", "Steins;Gate");
        entry.total_ep = 24;
        entry.current_ep = 3;
        entry.status = WatchStatus::Completed;
        assert!(validate_library_entry(&entry).is_err());
    }

    #[test]
    fn test_duplicate_genre_fails() {
        let mut entry = LibraryEntry::new("1", "Steins;Gate");
        entry.genres = vec!["Sci-Fi".into(), "Sci-Fi ".into()];
        assert!(validate_library_entry(&entry).is_err());
    }

    #[test]
    fn test_favorite_cap() {
        assert!(validate_favorite_cap(2, 3).is_ok());
        assert!(matches!(
            validate_favorite_cap(3, 3),
            Err(DomainError::FavoriteLimitReached { max: 3 })
        ));
    }
}
