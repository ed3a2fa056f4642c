//! Core error types for Folio.
//!
//! This module defines storage-agnostic error types. Storage-specific errors
//! are converted to these types by whichever repository implementation the
//! embedding application provides.

use thiserror::Error;

/// Type alias for Result using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Root error type for the portfolio domain.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Database operation failed: {0}")]
    Database(#[from] DatabaseError),

    #[error("Secret store error: {0}")]
    Secret(String),

    #[error("Research service error: {0}")]
    Research(String),
}

/// Storage-agnostic error type for repository operations.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// A query failed to execute.
    #[error("Database query failed: {0}")]
    QueryFailed(String),

    /// The requested record was not found.
    #[error("Record not found: {0}")]
    NotFound(String),
}

impl Error {
    /// Shorthand for a not-found database error.
    pub fn not_found(what: impl Into<String>) -> Self {
        Error::Database(DatabaseError::NotFound(what.into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(
            Error::not_found("ai_settings").to_string(),
            "Database operation failed: Record not found: ai_settings"
        );
        assert_eq!(
            Error::Secret("keychain locked".to_string()).to_string(),
            "Secret store error: keychain locked"
        );
        assert_eq!(
            Error::Research("index offline".to_string()).to_string(),
            "Research service error: index offline"
        );
    }
}
