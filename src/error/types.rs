// src/error/types.rs
use crate::domain::DomainError;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Pool error: {0}")]
    Pool(String),

    #[error("Domain error: {0}")]
    Domain(DomainError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    /// The record has neither a recoverable id nor a title.
    #[error("Entry could not be normalized: {0}")]
    Normalization(String),

    /// The backup document is not structured data we understand.
    #[error("Invalid backup format: {0}")]
    InvalidBackupFormat(String),

    #[error("Import file contains no recognizable entries")]
    EmptyImportFile,

    #[error("Favorite limit of {max} reached")]
    FavoriteLimitExceeded { max: usize },

    #[error("Catalog fetch failed for {id}: {reason}")]
    ExternalFetch { id: String, reason: String },

    /// The catalog answered with its rate-limit status (HTTP 429).
    #[error("Catalog rate limit hit while fetching {id}")]
    RateLimited { id: String },

    #[error("Store write failed: {0}")]
    StoreWrite(String),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Resource not found")]
    NotFound,

    #[error("Other error: {0}")]
    Other(String),
}

impl Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl From<DomainError> for AppError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Normalization(reason) => AppError::Normalization(reason),
            DomainError::FavoriteLimitReached { max } => AppError::FavoriteLimitExceeded { max },
            other => AppError::Domain(other),
        }
    }
}

impl From<r2d2::Error> for AppError {
    fn from(err: r2d2::Error) -> Self {
        AppError::Pool(err.to_string())
    }
}

impl From<toml::de::Error> for AppError {
    fn from(err: toml::de::Error) -> Self {
        AppError::Config(err.to_string())
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(err: tokio::task::JoinError) -> Self {
        AppError::StoreWrite(format!("Blocking store task failed: {}", err))
    }
}

pub type AppResult<T> = Result<T, AppError>;
