//! # AppError
//!
//! Centralized error handling for the symbol library.
//! Maps domain-specific failures to actionable error types.

use thiserror::Error;

/// The primary error type for all service operations.
#[derive(Error, Debug)]
pub enum AppError {
    /// Resource not found (e.g., Symbol, Category)
    #[error("{0} not found with ID {1}")]
    NotFound(&'static str, String),

    /// Validation failure (e.g., empty category name, non-image upload)
    #[error("validation error: {0}")]
    ValidationError(String),

    /// Resource already exists (e.g., duplicate symbol title)
    #[error("conflict: {0}")]
    Conflict(String),

    /// The resource was already moved to the trash
    #[error("gone: {0}")]
    Gone(String),

    /// The duplicated symbol's thumbnail could not be copied
    #[error("could not copy thumbnail: {0}")]
    ThumbnailCopy(String),

    /// Infrastructure failure outside of the ports
    #[error("internal service error: {0}")]
    Internal(String),

    /// A port implementation failed (DB down, disk full, ...)
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

impl AppError {
    /// Stable machine-readable code surfaced to API clients.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::NotFound("category", _) => "rest_term_invalid",
            AppError::NotFound(..) => "rest_post_invalid_id",
            AppError::ValidationError(_) => "rest_invalid_param",
            AppError::Conflict(_) => "rest_cannot_create_post",
            AppError::Gone(_) => "rest_already_trashed",
            AppError::ThumbnailCopy(_) => "could_not_generate_file",
            AppError::Internal(_) | AppError::Storage(_) => "internal_error",
        }
    }
}

/// A specialized Result type for symbol logic.
pub type Result<T> = std::result::Result<T, AppError>;
