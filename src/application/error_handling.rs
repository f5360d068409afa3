// src/application/error_handling.rs
//
// Error Handling for Commands
//
// ARCHITECTURE:
// - Maps internal errors → user-friendly responses
// - Provides consistent error format for UI
// - Never exposes internal implementation details
// - Logs errors for debugging

use log::error;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Standard error response for UI
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error_type: ErrorType,
    pub message: String,
    pub details: Option<String>,
}

/// Error categories for UI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorType {
    /// Resource not found
    NotFound,

    /// Invalid input or configuration
    Validation,

    /// Invariant violation or unusable record
    DomainError,

    /// The favorite cap rejected the change
    FavoriteLimit,

    /// Backup file cannot be used at all
    InvalidFile,

    /// Database/persistence error
    Database,

    /// Catalog API error, including rate limiting
    ExternalService,

    /// File system error
    FileSystem,

    /// The caller cancelled the operation
    Cancelled,

    /// Other/unknown error
    Internal,
}

impl ErrorResponse {
    fn new(error_type: ErrorType, message: impl Into<String>, details: Option<String>) -> Self {
        Self {
            success: false,
            error_type,
            message: message.into(),
            details,
        }
    }

    /// Create error response from AppError
    pub fn from_app_error(error: AppError) -> Self {
        match error {
            AppError::NotFound => Self::new(ErrorType::NotFound, "Entry not found", None),

            AppError::FavoriteLimitExceeded { max } => Self::new(
                ErrorType::FavoriteLimit,
                format!("You can have at most {} favorites", max),
                None,
            ),

            AppError::InvalidBackupFormat(reason) => Self::new(
                ErrorType::InvalidFile,
                "The backup file could not be read",
                Some(reason),
            ),

            AppError::EmptyImportFile => Self::new(
                ErrorType::InvalidFile,
                "The file contains no entries to import",
                None,
            ),

            AppError::Normalization(reason) => {
                Self::new(ErrorType::DomainError, "Entry data is incomplete", Some(reason))
            }

            AppError::Domain(domain_error) => Self::new(
                ErrorType::DomainError,
                "Domain validation failed",
                Some(domain_error.to_string()),
            ),

            AppError::Config(reason) => {
                Self::new(ErrorType::Validation, "Invalid configuration", Some(reason))
            }

            AppError::RateLimited { id } => Self::new(
                ErrorType::ExternalService,
                "The catalog is busy, try again in a moment",
                Some(id),
            ),

            AppError::ExternalFetch { id, reason } => Self::new(
                ErrorType::ExternalService,
                "Catalog request failed",
                Some(format!("{}: {}", id, reason)),
            ),

            AppError::Cancelled => Self::new(ErrorType::Cancelled, "Operation cancelled", None),

            AppError::StoreWrite(reason) => {
                error!("Store write error: {}", reason);
                Self::new(
                    ErrorType::Database,
                    "Your library could not be saved",
                    Some(reason),
                )
            }

            AppError::Database(db_error) => {
                // Log full error for debugging
                error!("Database error: {:?}", db_error);
                Self::new(
                    ErrorType::Database,
                    "Database operation failed",
                    Some("Check logs for details".to_string()),
                )
            }

            AppError::Pool(pool_error) => {
                error!("Connection pool error: {}", pool_error);
                Self::new(ErrorType::Database, "Database connection failed", None)
            }

            AppError::Serialization(serde_error) => {
                error!("Serialization error: {:?}", serde_error);
                Self::new(ErrorType::Internal, "Data serialization failed", None)
            }

            AppError::Io(io_error) => {
                error!("IO error: {:?}", io_error);
                Self::new(
                    ErrorType::FileSystem,
                    "File system operation failed",
                    Some(io_error.to_string()),
                )
            }

            AppError::Other(message) => {
                error!("Other error: {}", message);
                Self::new(ErrorType::Internal, message, None)
            }
        }
    }

    /// Create validation error
    pub fn validation(message: String) -> Self {
        Self::new(ErrorType::Validation, message, None)
    }
}

/// Helper trait to convert Results to a serialized ErrorResponse
pub trait ToErrorResponse<T> {
    fn to_error_response(self) -> Result<T, String>;
}

impl<T> ToErrorResponse<T> for Result<T, AppError> {
    fn to_error_response(self) -> Result<T, String> {
        self.map_err(|e| {
            let error_response = ErrorResponse::from_app_error(e);
            serde_json::to_string(&error_response)
                .unwrap_or_else(|_| "Internal error".to_string())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_error() {
        let error = ErrorResponse::from_app_error(AppError::NotFound);
        assert_eq!(error.error_type, ErrorType::NotFound);
        assert!(!error.success);
    }

    #[test]
    fn test_favorite_limit_message() {
        let error = ErrorResponse::from_app_error(AppError::FavoriteLimitExceeded { max: 10 });
        assert_eq!(error.error_type, ErrorType::FavoriteLimit);
        assert_eq!(error.message, "You can have at most 10 favorites");
    }

    #[test]
    fn test_file_level_errors_share_category() {
        let invalid = ErrorResponse::from_app_error(AppError::InvalidBackupFormat("x".into()));
        let empty = ErrorResponse::from_app_error(AppError::EmptyImportFile);
        assert_eq!(invalid.error_type, ErrorType::InvalidFile);
        assert_eq!(empty.error_type, ErrorType::InvalidFile);
    }

    #[test]
    fn test_serialized_result() {
        let result: Result<(), AppError> = Err(AppError::RateLimited { id: "1".into() });
        let json = result.to_error_response().unwrap_err();
        assert!(json.contains("external_service"));
    }
}
