// src/config.rs
//
// Engine configuration
//
// Every knob has a default, so `SyncConfig::default()` is a working setup.
// Embedding applications may override values from a TOML document.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

pub const DEFAULT_MAX_FAVORITES: usize = 10;
pub const DEFAULT_CONCURRENCY: usize = 3;
pub const DEFAULT_BATCH_DELAY_MS: u64 = 1500;
pub const DEFAULT_IMPORT_DELAY_MS: u64 = 1000;
pub const DEFAULT_CATALOG_URL: &str = "https://api.jikan.moe/v4";
pub const DEFAULT_CATALOG_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CATALOG_MIN_INTERVAL_MS: u64 = 350;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Upper bound on favorites per library
    pub max_favorites: usize,
    pub enrichment: EnrichmentConfig,
    pub catalog: CatalogConfig,
    /// SQLite file. `None` uses the platform data directory.
    pub database_path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnrichmentConfig {
    /// Requests issued together in one batch
    pub concurrency: usize,
    /// Pause between batches
    pub batch_delay_ms: u64,
    /// Pause between sequential fetches during import backfill
    pub import_delay_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    /// Minimum spacing between two requests from this process
    pub min_interval_ms: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            max_favorites: DEFAULT_MAX_FAVORITES,
            enrichment: EnrichmentConfig::default(),
            catalog: CatalogConfig::default(),
            database_path: None,
        }
    }
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            batch_delay_ms: DEFAULT_BATCH_DELAY_MS,
            import_delay_ms: DEFAULT_IMPORT_DELAY_MS,
        }
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_CATALOG_URL.to_string(),
            timeout_secs: DEFAULT_CATALOG_TIMEOUT_SECS,
            min_interval_ms: DEFAULT_CATALOG_MIN_INTERVAL_MS,
        }
    }
}

impl SyncConfig {
    /// Parse and validate a TOML document. Missing keys keep their defaults.
    pub fn from_toml_str(source: &str) -> AppResult<Self> {
        let config: SyncConfig = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.max_favorites == 0 {
            return Err(AppError::Config("max_favorites must be at least 1".to_string()));
        }
        if self.enrichment.concurrency == 0 {
            return Err(AppError::Config(
                "enrichment.concurrency must be at least 1".to_string(),
            ));
        }
        if self.catalog.base_url.trim().is_empty() {
            return Err(AppError::Config("catalog.base_url cannot be empty".to_string()));
        }
        Ok(())
    }
}

impl EnrichmentConfig {
    pub fn batch_delay(&self) -> Duration {
        Duration::from_millis(self.batch_delay_ms)
    }

    pub fn import_delay(&self) -> Duration {
        Duration::from_millis(self.import_delay_ms)
    }

    /// No delays, for tests and local catalogs
    pub fn immediate(concurrency: usize) -> Self {
        Self {
            concurrency,
            batch_delay_ms: 0,
            import_delay_ms: 0,
        }
    }
}

impl CatalogConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn min_interval(&self) -> Duration {
        Duration::from_millis(self.min_interval_ms)
    }
}
