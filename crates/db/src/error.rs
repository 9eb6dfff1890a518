//! Error taxonomy shared by every storage backend.

use std::time::Duration;

use thiserror::Error;

use crate::book::ValidationError;

pub type StorageResult<T> = Result<T, StorageError>;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("book id {id} not found")]
    NotFound { id: i64 },

    /// A write collided with an existing row; `id` is set only when the
    /// colliding id is known.
    #[error("{}", conflict_message(.id))]
    Conflict { id: Option<i64> },

    #[error("{operation} timed out after {after:?}")]
    Timeout {
        operation: &'static str,
        after: Duration,
    },

    #[error("storage backend unreachable: {0}")]
    Connectivity(String),

    #[error("storage failure: {0}")]
    Internal(String),
}

fn conflict_message(id: &Option<i64>) -> String {
    match id {
        Some(id) => format!("book id {id} already exists"),
        None => "book already exists".to_string(),
    }
}

impl StorageError {
    pub fn not_found(id: i64) -> Self {
        Self::NotFound { id }
    }

    pub fn timeout(operation: &'static str, after: Duration) -> Self {
        Self::Timeout { operation, after }
    }

    pub fn connectivity(message: impl Into<String>) -> Self {
        Self::Connectivity(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Stable machine-readable code, used in logs and response bodies.
    pub fn code(&self) -> &'static str {
        match self {
            StorageError::Validation(_) => "validation_error",
            StorageError::NotFound { .. } => "not_found",
            StorageError::Conflict { .. } => "conflict",
            StorageError::Timeout { .. } => "timeout",
            StorageError::Connectivity(_) => "unavailable",
            StorageError::Internal(_) => "internal_error",
        }
    }
}
