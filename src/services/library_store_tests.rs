// src/services/library_store_tests.rs
//
// Canonical Store behavior
//
// INVARIANTS TESTED:
// - Progress is clamped into [0, total] and reaching the total completes
// - Completing with a known total fills progress
// - The favorite cap rejects the (N+1)th favorite without writing
// - Implicit creation through set_favorite is two writes, both gated by the cap
// - Removal is idempotent
// - Every write is stamped and published to subscribers

#[cfg(test)]
mod store_tests {
    use std::sync::Arc;

    use crate::domain::{CatalogPayload, EntryInput, LibraryEntry, RawId, TagRef, WatchStatus};
    use crate::error::AppError;
    use crate::events::{EventBus, FavoriteChanged, LibraryEntryRemoved};
    use crate::repositories::{InMemoryLibraryRepository, LibraryRepository, MockLibraryRepository};
    use crate::services::LibraryStore;

    fn store_with(entries: Vec<LibraryEntry>, max_favorites: usize) -> (LibraryStore, Arc<EventBus>) {
        let repo: Arc<dyn LibraryRepository> = Arc::new(InMemoryLibraryRepository::with_entries(entries));
        let bus = Arc::new(EventBus::new());
        (LibraryStore::new(repo, Arc::clone(&bus), max_favorites), bus)
    }

    fn series(id: &str, title: &str, total: u32) -> LibraryEntry {
        let mut entry = LibraryEntry::new(id, title);
        entry.total_ep = total;
        entry
    }

    fn catalog_payload(id: i64, title: &str) -> CatalogPayload {
        CatalogPayload {
            mal_id: Some(RawId::Integer(id)),
            title: Some(title.to_string()),
            episodes: Some(12),
            genres: Some(vec![TagRef::Name("Drama".to_string())]),
            ..CatalogPayload::default()
        }
    }

    // ========================================================================
    // PROGRESS AND STATUS
    // ========================================================================

    #[tokio::test]
    async fn test_progress_is_clamped_into_total() {
        let (store, _) = store_with(vec![series("1", "Mob Psycho 100", 12)], 10);

        for requested in [-5i64, 0, 3, 11, 12, 13, 500] {
            let entry = store.set_progress("1", requested, 12).await.unwrap();
            assert!(entry.current_ep <= 12, "requested {}", requested);
        }
        let stored = store.get("1").await.unwrap().unwrap();
        assert_eq!(stored.current_ep, 12);
    }

    #[tokio::test]
    async fn test_reaching_total_completes_entry() {
        let (store, _) = store_with(vec![series("1", "Mob Psycho 100", 12)], 10);

        let partial = store.set_progress("1", 11, 12).await.unwrap();
        assert_eq!(partial.status, WatchStatus::PlanToWatch);

        let done = store.set_progress("1", 12, 12).await.unwrap();
        assert_eq!(done.status, WatchStatus::Completed);
        assert_eq!(done.current_ep, 12);
    }

    #[tokio::test]
    async fn test_negative_progress_floors_at_zero() {
        let (store, _) = store_with(vec![series("1", "Mob Psycho 100", 12)], 10);
        let entry = store.set_progress("1", -3, 12).await.unwrap();
        assert_eq!(entry.current_ep, 0);
    }

    #[tokio::test]
    async fn test_completing_fills_progress() {
        let (store, _) = store_with(vec![series("1", "Mob Psycho 100", 0)], 10);

        let entry = store
            .set_status("1", WatchStatus::Completed, Some(12))
            .await
            .unwrap();
        assert_eq!(entry.total_ep, 12);
        assert_eq!(entry.current_ep, 12);
    }

    #[tokio::test]
    async fn test_status_change_without_total_keeps_progress() {
        let mut entry = series("1", "One Piece", 0);
        entry.current_ep = 400;
        let (store, _) = store_with(vec![entry], 10);

        let updated = store.set_status("1", WatchStatus::Completed, None).await.unwrap();
        assert_eq!(updated.status, WatchStatus::Completed);
        assert_eq!(updated.current_ep, 400);
    }

    #[tokio::test]
    async fn test_mutating_unknown_entry_is_not_found() {
        let (store, _) = store_with(vec![], 10);
        assert!(matches!(
            store.set_progress("404", 1, 12).await,
            Err(AppError::NotFound)
        ));
        assert!(matches!(
            store.set_score("404", 5).await,
            Err(AppError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_score_is_capped() {
        let (store, _) = store_with(vec![series("1", "Mob Psycho 100", 12)], 10);
        assert_eq!(store.set_score("1", 8).await.unwrap().score, 8);
        assert_eq!(store.set_score("1", 42).await.unwrap().score, 10);
    }

    // ========================================================================
    // FAVORITES
    // ========================================================================

    #[tokio::test]
    async fn test_favorite_cap_rejects_next_favorite() {
        let entries = (1..=4).map(|i| series(&i.to_string(), &format!("Show {}", i), 12)).collect();
        let (store, _) = store_with(entries, 3);

        for id in ["1", "2", "3"] {
            store.set_favorite(id, true, None).await.unwrap();
        }
        let rejected = store.set_favorite("4", true, None).await;

        assert!(matches!(
            rejected,
            Err(AppError::FavoriteLimitExceeded { max: 3 })
        ));
        assert!(!store.get("4").await.unwrap().unwrap().is_favorite);
        assert_eq!(store.favorites_count().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_unfavorite_succeeds_at_cap() {
        let mut entry = series("1", "Show", 12);
        entry.is_favorite = true;
        let (store, bus) = store_with(vec![entry], 1);

        let updated = store.set_favorite("1", false, None).await.unwrap();
        assert!(!updated.is_favorite);
        assert!(bus
            .get_event_log()
            .iter()
            .any(|e| e.event_type == "FavoriteChanged"));
    }

    #[tokio::test]
    async fn test_refavoriting_same_entry_is_a_no_op() {
        let mut entry = series("1", "Show", 12);
        entry.is_favorite = true;
        let (store, bus) = store_with(vec![entry], 1);

        store.set_favorite("1", true, None).await.unwrap();
        assert!(bus.get_event_log().is_empty());
    }

    #[tokio::test]
    async fn test_favoriting_unknown_item_creates_it_first() {
        let (store, bus) = store_with(vec![], 10);
        let flipped = Arc::new(std::sync::Mutex::new(Vec::new()));
        let sink = Arc::clone(&flipped);
        bus.subscribe::<FavoriteChanged, _>(move |e| sink.lock().unwrap().push(e.entry_id.clone()));

        let entry = store
            .set_favorite("5114", true, Some(catalog_payload(5114, "Fullmetal Alchemist")))
            .await
            .unwrap();

        assert!(entry.is_favorite);
        assert_eq!(entry.status, WatchStatus::PlanToWatch);
        assert_eq!(entry.genres, vec!["Drama"]);
        assert_eq!(*flipped.lock().unwrap(), vec!["5114".to_string()]);

        let upserts = bus
            .get_event_log()
            .iter()
            .filter(|e| e.event_type == "LibraryEntryUpserted")
            .count();
        assert_eq!(upserts, 2);
    }

    #[tokio::test]
    async fn test_implicit_creation_rejected_at_cap_writes_nothing() {
        let mut fav = series("1", "Show", 12);
        fav.is_favorite = true;
        let (store, _) = store_with(vec![fav], 1);

        let result = store
            .set_favorite("2", true, Some(catalog_payload(2, "Other")))
            .await;

        assert!(matches!(result, Err(AppError::FavoriteLimitExceeded { .. })));
        assert!(store.get("2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_favorite_with_mismatched_payload_writes_nothing() {
        let (store, bus) = store_with(vec![], 10);

        let result = store
            .set_favorite("5114", true, Some(catalog_payload(1, "Cowboy Bebop")))
            .await;

        assert!(matches!(result, Err(AppError::Domain(_))));
        assert!(store.get("5114").await.unwrap().is_none());
        assert!(store.get("1").await.unwrap().is_none());
        assert!(bus.get_event_log().is_empty());
    }

    #[tokio::test]
    async fn test_favoriting_unknown_item_without_payload_is_not_found() {
        let (store, _) = store_with(vec![], 10);
        assert!(matches!(
            store.set_favorite("9", true, None).await,
            Err(AppError::NotFound)
        ));
    }

    // ========================================================================
    // UPSERT / REMOVE / SUBSCRIBE
    // ========================================================================

    #[tokio::test]
    async fn test_upsert_keeps_user_owned_fields() {
        let mut stored = series("1", "Cowboy Bebop", 26);
        stored.score = 9;
        stored.current_ep = 10;
        stored.is_favorite = true;
        stored.status = WatchStatus::Watching;
        let (store, _) = store_with(vec![stored], 10);

        let mut candidate = LibraryEntry::new("1", "Cowboy Bebop");
        candidate.image = Some("https://cdn.example/bebop.jpg".to_string());
        candidate.genres = vec!["Action".to_string(), "Action".to_string()];

        let merged = store.upsert(EntryInput::Stored(candidate), None).await.unwrap();
        assert_eq!(merged.score, 9);
        assert_eq!(merged.current_ep, 10);
        assert!(merged.is_favorite);
        assert_eq!(merged.status, WatchStatus::Watching);
        assert_eq!(merged.image.as_deref(), Some("https://cdn.example/bebop.jpg"));
        assert_eq!(merged.genres, vec!["Action"]);
        assert_eq!(merged.total_ep, 26);
    }

    #[tokio::test]
    async fn test_upsert_is_idempotent() {
        let (store, _) = store_with(vec![], 10);
        let candidate = || EntryInput::Catalog(catalog_payload(1, "Cowboy Bebop"));

        let first = store.upsert(candidate(), None).await.unwrap();
        let second = store.upsert(candidate(), None).await.unwrap();

        assert_eq!(
            LibraryEntry { last_updated: None, ..first },
            LibraryEntry { last_updated: None, ..second }
        );
        assert_eq!(store.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_writes_are_stamped() {
        let (store, _) = store_with(vec![series("1", "Show", 12)], 10);
        let before = chrono::Utc::now();
        let entry = store.set_progress("1", 2, 12).await.unwrap();
        assert!(entry.last_updated.unwrap() >= before);
    }

    #[tokio::test]
    async fn test_remove_is_idempotent() {
        let (store, bus) = store_with(vec![series("1", "Show", 12)], 10);
        let removed = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let counter = Arc::clone(&removed);
        bus.subscribe::<LibraryEntryRemoved, _>(move |_| {
            counter.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        });

        assert!(store.remove("1").await.unwrap());
        assert!(!store.remove("1").await.unwrap());
        assert!(!store.remove("never-existed").await.unwrap());
        assert_eq!(removed.load(std::sync::atomic::Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_subscribers_see_writes() {
        let (store, _) = store_with(vec![], 10);
        let mut live = store.subscribe();
        assert!(live.borrow().is_empty());

        store
            .add_from_catalog(catalog_payload(21, "One Piece"), Some(WatchStatus::Watching))
            .await
            .unwrap();

        live.changed().await.unwrap();
        let snapshot = live.borrow_and_update().clone();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].id, "21");
        assert_eq!(snapshot[0].status, WatchStatus::Watching);
    }

    #[tokio::test]
    async fn test_store_write_failure_surfaces() {
        let mut repo = MockLibraryRepository::new();
        repo.expect_get()
            .returning(|id| Ok(Some(LibraryEntry::new(id, "Show"))));
        repo.expect_save()
            .returning(|_| Err(AppError::StoreWrite("permission denied".to_string())));

        let store = LibraryStore::new(Arc::new(repo), Arc::new(EventBus::new()), 10);
        let result = store.set_progress("1", 3, 12).await;

        assert!(matches!(result, Err(AppError::StoreWrite(_))));
    }
}
