pub mod entity;
pub mod invariants;

pub use entity::{is_catalog_id, LibraryEntry, WatchStatus, MAX_SCORE};
pub use invariants::{validate_favorite_cap, validate_library_entry};
