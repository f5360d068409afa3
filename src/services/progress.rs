// src/services/progress.rs
//
// Progress reporting and structured results shared by the batch services.

use serde::Serialize;

use crate::error::AppError;

/// Aggregate progress of one batch operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Progress {
    pub done: usize,
    pub total: usize,
}

impl Progress {
    pub fn is_complete(&self) -> bool {
        self.done >= self.total
    }
}

/// Progress callback supplied by the caller. It may borrow from the
/// caller's stack for the duration of the call.
pub type ProgressFn<'a> = dyn Fn(Progress) + Send + Sync + 'a;

/// Monotonic counter in front of an optional callback.
///
/// `done` only grows and never passes `total`; zero-sized steps are not
/// reported, so consecutive reports are strictly increasing.
pub struct ProgressTracker<'a> {
    done: usize,
    total: usize,
    callback: Option<&'a ProgressFn<'a>>,
}

impl<'a> ProgressTracker<'a> {
    pub fn new(total: usize, callback: Option<&'a ProgressFn<'a>>) -> Self {
        Self {
            done: 0,
            total,
            callback,
        }
    }

    pub fn advance(&mut self, units: usize) {
        let next = (self.done + units).min(self.total);
        if next == self.done {
            return;
        }
        self.done = next;
        if let Some(callback) = self.callback {
            callback(self.current());
        }
    }

    pub fn current(&self) -> Progress {
        Progress {
            done: self.done,
            total: self.total,
        }
    }
}

/// One item a batch operation could not handle
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemFailure {
    pub id: String,
    pub reason: String,
}

impl ItemFailure {
    pub fn new(id: impl Into<String>, error: &AppError) -> Self {
        Self {
            id: id.into(),
            reason: error.to_string(),
        }
    }
}

/// Outcome of one enrichment pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EnrichmentReport {
    pub total: usize,
    pub refreshed: usize,
    pub failed: Vec<ItemFailure>,
    pub cancelled: bool,
}

/// Outcome of one import
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    /// Candidate records handed to the committer
    pub total: usize,
    /// Records selected for writing; the count surfaced to the user
    pub available: usize,
    /// Already stored and left alone because overwrite was off
    pub skipped: usize,
    pub written: usize,
    /// Records that received catalog metadata before being written
    pub backfilled: usize,
    /// Backfill attempts that failed; those records were written as they were
    pub backfill_failed: usize,
    pub failed: Vec<ItemFailure>,
    pub cancelled: bool,
}
