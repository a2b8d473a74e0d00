//! Domain error taxonomy.

use thiserror::Error;

/// Errors surfaced by domain services and the persistence interface.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DomainError {
    /// Caller has no valid identity.
    #[error("Authentication required")]
    AuthenticationRequired,

    /// Caller is known but lacks the required role.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    /// Underlying storage failure.
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Failure inside the event evaluator.
    #[error("Evaluation error: {0}")]
    Evaluation(String),
}

impl DomainError {
    pub fn persistence(err: impl std::fmt::Display) -> Self {
        DomainError::Persistence(err.to_string())
    }

    pub fn is_persistence(&self) -> bool {
        matches!(self, DomainError::Persistence(_))
    }
}

impl From<sqlx::Error> for DomainError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DomainError::NotFound("Resource not found".into()),
            other => DomainError::Persistence(other.to_string()),
        }
    }
}
