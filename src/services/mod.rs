// src/services/mod.rs
//
// Services Module - Orchestration Layer

pub mod enrichment_queue;
pub mod import_committer;
pub mod library_store;
pub mod progress;

#[cfg(test)]
mod library_store_tests;

pub use enrichment_queue::EnrichmentQueue;
pub use import_committer::ImportCommitter;
pub use library_store::LibraryStore;
pub use progress::{
    EnrichmentReport, ImportReport, ItemFailure, Progress, ProgressFn, ProgressTracker,
};
