//! # Error Types
//!
//! Errors shared by repositories and domain services.

use thiserror::Error;

/// Errors surfaced by repository implementations.
#[derive(Debug, Clone, Error)]
pub enum RepositoryError {
    /// The requested row does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// A uniqueness or state constraint was violated.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The backing store rejected the operation.
    #[error("Storage error: {0}")]
    Storage(String),
}

/// Errors surfaced by domain services.
#[derive(Debug, Clone, Error)]
pub enum ServiceError {
    /// A repository call failed.
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    /// The database collaborator is unavailable.
    #[error("Database unavailable: {0}")]
    Database(String),

    /// The caller supplied invalid input.
    #[error("Invalid input: {0}")]
    Invalid(String),
}
