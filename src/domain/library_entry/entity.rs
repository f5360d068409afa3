use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Highest personal rating a user can give.
pub const MAX_SCORE: u8 = 10;

/// One tracked catalog item in a user's library.
/// This is the root (and only) entity of the library domain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LibraryEntry {
    /// External catalog identifier, always stored as a string.
    /// Primary key and dedup key.
    pub id: String,

    pub title: String,

    pub image: Option<String>,

    /// Total known episode count, 0 when unknown
    pub total_ep: u32,

    /// Episodes the user has consumed
    pub current_ep: u32,

    /// Personal rating 0..=10, 0 when unrated
    pub score: u8,

    pub status: WatchStatus,

    /// Deduplicated, order is not significant
    pub genres: Vec<String>,

    pub studios: Vec<String>,

    #[serde(rename = "type")]
    pub media_type: Option<String>,

    pub year: Option<i32>,

    pub season: Option<String>,

    /// Catalog synopsis. Its absence marks an entry as not yet enriched.
    #[serde(default)]
    pub synopsis: Option<String>,

    pub is_favorite: bool,

    /// Assigned by the store on every write
    pub last_updated: Option<DateTime<Utc>>,
}

/// Where the user stands with an entry
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WatchStatus {
    Watching,
    Completed,
    #[default]
    PlanToWatch,
    Dropped,
    Paused,
}

impl WatchStatus {
    /// Parse a status token from any import vocabulary.
    ///
    /// Case, dashes and spaces are ignored, so `"Plan to Watch"`,
    /// `"plan-to-watch"` and `"plan_to_watch"` are the same token.
    /// `on_hold` has no canonical counterpart and collapses into `Paused`.
    pub fn from_token(token: &str) -> Option<Self> {
        let key: String = token
            .trim()
            .chars()
            .map(|c| match c {
                '-' | ' ' => '_',
                other => other.to_ascii_lowercase(),
            })
            .collect();

        match key.as_str() {
            "watching" => Some(WatchStatus::Watching),
            "completed" => Some(WatchStatus::Completed),
            "plan_to_watch" => Some(WatchStatus::PlanToWatch),
            "dropped" => Some(WatchStatus::Dropped),
            "paused" | "on_hold" => Some(WatchStatus::Paused),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            WatchStatus::Watching => "watching",
            WatchStatus::Completed => "completed",
            WatchStatus::PlanToWatch => "plan_to_watch",
            WatchStatus::Dropped => "dropped",
            WatchStatus::Paused => "paused",
        }
    }
}

impl std::fmt::Display for WatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl LibraryEntry {
    /// Create a fresh entry with default user state
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            image: None,
            total_ep: 0,
            current_ep: 0,
            score: 0,
            status: WatchStatus::PlanToWatch,
            genres: Vec::new(),
            studios: Vec::new(),
            media_type: None,
            year: None,
            season: None,
            synopsis: None,
            is_favorite: false,
            last_updated: None,
        }
    }

    /// Record watched episodes.
    ///
    /// With a known total the value is clamped into `0..=total` and reaching
    /// the total marks the entry completed in the same change. Going back
    /// below the total on a completed entry returns it to `watching`.
    pub fn apply_progress(&mut self, new_ep: i64, total_ep: u32) {
        if total_ep > 0 {
            self.total_ep = total_ep;
        }

        let floor = new_ep.max(0);
        let ceiling = if self.total_ep > 0 {
            i64::from(self.total_ep)
        } else {
            i64::from(u32::MAX)
        };
        let clamped = floor.min(ceiling) as u32;

        self.current_ep = clamped;
        if self.total_ep > 0 && clamped == self.total_ep {
            self.status = WatchStatus::Completed;
        } else if self.status == WatchStatus::Completed && self.total_ep > 0 {
            // Rewinding a finished series puts it back in progress
            self.status = WatchStatus::Watching;
        }
    }

    /// Change status. Completing an entry with a known total fills progress.
    pub fn apply_status(&mut self, status: WatchStatus, total_ep: Option<u32>) {
        if let Some(total) = total_ep.filter(|t| *t > 0) {
            self.total_ep = total;
        }
        self.status = status;
        if status == WatchStatus::Completed && self.total_ep > 0 {
            self.current_ep = self.total_ep;
        }
    }

    pub fn set_score(&mut self, score: u8) {
        self.score = score.min(MAX_SCORE);
    }

    /// Bring the entry back within its invariants without rejecting it:
    /// genres are trimmed and deduplicated, progress is clamped, completion
    /// fills progress and the score is capped.
    pub fn enforce_invariants(&mut self) {
        self.genres = dedupe_tags(std::mem::take(&mut self.genres));
        self.studios = self
            .studios
            .drain(..)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        if self.total_ep > 0 {
            self.current_ep = self.current_ep.min(self.total_ep);
            if self.status == WatchStatus::Completed {
                self.current_ep = self.total_ep;
            }
        }
        self.score = self.score.min(MAX_SCORE);
    }

    /// True when catalog metadata still has to be fetched: no synopsis,
    /// no genres, or an id that is not a plain catalog number.
    pub fn needs_enrichment(&self) -> bool {
        self.synopsis.is_none() || self.genres.is_empty() || !is_catalog_id(&self.id)
    }

    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.last_updated = Some(now);
    }
}

/// Catalog ids are plain decimal numbers
pub fn is_catalog_id(id: &str) -> bool {
    !id.is_empty() && id.chars().all(|c| c.is_ascii_digit())
}

/// Trim, drop empty values and keep the first occurrence of each tag
pub fn dedupe_tags<I>(tags: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut seen = std::collections::HashSet::new();
    tags.into_iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .filter(|t| seen.insert(t.clone()))
        .collect()
}
