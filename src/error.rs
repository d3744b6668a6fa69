//! Data-layer error types
//!
//! Ownership refusals are not errors: they come back as `Denial` inside
//! `DeleteResult`/`UpdateResult`. Everything here is either caller input
//! that can't be stored or a backend failure.

use thiserror::Error;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Email already registered: {0}")]
    EmailTaken(String),

    #[error("No user found with id {0}")]
    OwnerNotFound(String),

    #[error("Backend not connected")]
    NotConnected,

    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("PostgreSQL error: {0}")]
    Postgres(#[from] sqlx::Error),

    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Document encoding error: {0}")]
    Encoding(#[from] serde_json::Error),
}

impl StoreError {
    /// True when the caller sent something the store refuses to persist
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            StoreError::Validation(_) | StoreError::EmailTaken(_) | StoreError::OwnerNotFound(_)
        )
    }
}
