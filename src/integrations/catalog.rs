// src/integrations/catalog.rs
//
// Seam between the engine and the external catalog.

use async_trait::async_trait;

use crate::domain::CatalogPayload;
use crate::error::AppResult;

/// Read-only source of catalog metadata, keyed by catalog id.
///
/// Implementations report a rate-limit rejection as `AppError::RateLimited`
/// and every other failure as `AppError::ExternalFetch`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CatalogSource: Send + Sync {
    async fn fetch_anime(&self, id: &str) -> AppResult<CatalogPayload>;
}
