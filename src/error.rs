//! Error types for the document store and repositories.

use crate::types::ChirpId;
use thiserror::Error;

/// Main error type for store and repository operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Corruption detected: {0}")]
    Corruption(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Chirp not found: {0}")]
    ChirpNotFound(ChirpId),

    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("Email already in use: {0}")]
    EmailInUse(String),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Unsupported operation: {0}")]
    Unsupported(&'static str),

    #[error("Store is locked by another process")]
    Locked,

    #[error("Store not initialized")]
    NotInitialized,
}

impl StoreError {
    /// Whether this is an expected lookup miss.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::ChirpNotFound(_) | StoreError::UserNotFound(_))
    }

    /// Whether this is a uniqueness violation.
    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::EmailInUse(_))
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Serialization(e.to_string())
    }
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
