// src/integrations/jikan/client.rs
//
// Jikan (MyAnimeList) REST client
//
// ARCHITECTURE:
// - Maps external payloads into CatalogPayload (NO library mutation)
// - Spaces requests with a process-local limiter
// - HTTP 429 surfaces as AppError::RateLimited so callers can skip and go on

use std::time::{Duration, Instant};

use async_trait::async_trait;
use log::debug;
use reqwest::{header, Client, StatusCode};
use serde::Deserialize;
use tokio::sync::Mutex;

use crate::config::CatalogConfig;
use crate::domain::library_entry::is_catalog_id;
use crate::domain::CatalogPayload;
use crate::error::{AppError, AppResult};
use crate::integrations::catalog::CatalogSource;

/// Single-item response wrapper
#[derive(Debug, Deserialize)]
struct AnimeResponse {
    data: CatalogPayload,
}

/// Rate limiter state
struct RateLimiter {
    last_request: Option<Instant>,
    min_interval: Duration,
}

impl RateLimiter {
    fn new(min_interval: Duration) -> Self {
        Self {
            last_request: None,
            min_interval,
        }
    }

    /// How long to sleep before the next request may go out
    /// Each reservation takes the slot after the previous one, so callers
    /// arriving together leave one interval apart.
    fn reserve(&mut self, now: Instant) -> Duration {
        let next = self
            .last_request
            .map_or(now, |last| (last + self.min_interval).max(now));
        self.last_request = Some(next);
        next.saturating_duration_since(now)
    }
}

/// Jikan API Client
pub struct JikanClient {
    base_url: String,
    http_client: Client,
    rate_limiter: Mutex<RateLimiter>,
}

impl JikanClient {
    pub fn new(config: &CatalogConfig) -> AppResult<Self> {
        let http_client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| AppError::Other(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            http_client,
            rate_limiter: Mutex::new(RateLimiter::new(config.min_interval())),
        })
    }

    /// Get anime metadata by catalog id
    pub async fn get_anime(&self, id: &str) -> AppResult<CatalogPayload> {
        if !is_catalog_id(id) {
            return Err(AppError::ExternalFetch {
                id: id.to_string(),
                reason: "not a catalog id".to_string(),
            });
        }

        self.wait_turn().await;

        let url = format!("{}/anime/{}", self.base_url, id);
        debug!("GET {}", url);

        let response = self
            .http_client
            .get(&url)
            .header(header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| fetch_error(id, format!("request failed: {}", e)))?;

        match response.status() {
            StatusCode::TOO_MANY_REQUESTS => {
                return Err(AppError::RateLimited { id: id.to_string() });
            }
            status if !status.is_success() => {
                return Err(fetch_error(id, format!("catalog returned status {}", status)));
            }
            _ => {}
        }

        let body: AnimeResponse = response
            .json()
            .await
            .map_err(|e| fetch_error(id, format!("unreadable catalog response: {}", e)))?;

        Ok(body.data)
    }

    async fn wait_turn(&self) {
        let wait = self.rate_limiter.lock().await.reserve(Instant::now());
        if !wait.is_zero() {
            tokio::time::sleep(wait).await;
        }
    }
}

fn fetch_error(id: &str, reason: String) -> AppError {
    AppError::ExternalFetch {
        id: id.to_string(),
        reason,
    }
}

#[async_trait]
impl CatalogSource for JikanClient {
    async fn fetch_anime(&self, id: &str) -> AppResult<CatalogPayload> {
        self.get_anime(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = JikanClient::new(&CatalogConfig {
            base_url: "https://api.jikan.moe/v4/".to_string(),
            ..CatalogConfig::default()
        })
        .unwrap();
        assert_eq!(client.base_url, "https://api.jikan.moe/v4");
    }

    #[tokio::test]
    async fn test_non_catalog_id_fails_without_request() {
        let client = JikanClient::new(&CatalogConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            ..CatalogConfig::default()
        })
        .unwrap();
        let result = client.get_anime("legacy-uuid").await;
        assert!(matches!(result, Err(AppError::ExternalFetch { .. })));
    }

    #[test]
    fn test_rate_limiter_spaces_requests() {
        let mut limiter = RateLimiter::new(Duration::from_millis(500));
        let start = Instant::now();

        assert_eq!(limiter.reserve(start), Duration::ZERO);
        assert_eq!(limiter.reserve(start), Duration::from_millis(500));
        // Third caller queues behind the second reservation
        assert_eq!(limiter.reserve(start), Duration::from_millis(1000));
        assert_eq!(
            limiter.reserve(start + Duration::from_secs(5)),
            Duration::ZERO
        );
    }

    #[test]
    fn test_response_wrapper_parses_catalog_shape() {
        let body = r#"{"data": {"mal_id": 1, "title": "Cowboy Bebop", "episodes": 26,
            "images": {"jpg": {"image_url": "a.jpg", "large_image_url": "b.jpg"}},
            "genres": [{"mal_id": 1, "type": "anime", "name": "Action", "url": "x"}],
            "studios": [{"mal_id": 14, "type": "anime", "name": "Sunrise", "url": "y"}],
            "year": 1998, "season": "spring", "type": "TV", "synopsis": "..."}}"#;
        let parsed: AnimeResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.data.title.as_deref(), Some("Cowboy Bebop"));
        assert_eq!(parsed.data.episodes, Some(26));
        assert_eq!(parsed.data.media_type.as_deref(), Some("TV"));
    }
}
