//! # AppError
//!
//! Centralized error handling for the member-portal ecosystem.
//! Maps domain-specific failures to actionable error types.

use thiserror::Error;

/// The primary error type for all mp-core operations.
#[derive(Error, Debug)]
pub enum AppError {
    /// Resource not found (e.g., a content record or member)
    #[error("{0} not found with ID {1}")]
    NotFound(String, String),

    /// Validation failure (e.g., empty title, title too long)
    #[error("validation error: {0}")]
    Validation(String),

    /// The authenticated principal lacks the required relationship
    /// to the record (ownership, or ownership-or-admin for delete)
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// The filesystem could not complete a save; the whole operation
    /// aborts and no partial record is committed
    #[error("storage failure: {0}")]
    Storage(String),

    /// A concurrent writer committed first (stale revision)
    #[error("conflict: {0}")]
    Conflict(String),

    /// Infrastructure failure (e.g., database down)
    #[error("internal service error: {0}")]
    Internal(String),
}

impl AppError {
    /// Shorthand for the common "record id did not resolve" case.
    pub fn not_found(what: &str, id: impl ToString) -> Self {
        Self::NotFound(what.to_string(), id.to_string())
    }
}

/// A specialized Result type for member-portal logic.
pub type Result<T> = std::result::Result<T, AppError>;
