//! Storage-specific error types.
//!
//! All storage operations return [`StorageError`] on failure, which can be
//! matched to determine the underlying cause (validation, missing entity,
//! coercion, database, etc.).

use std::fmt;

use thiserror::Error;

use crate::entity::CoercionError;
use crate::validation::ValidationError;

/// What a lookup failed to find.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Missing {
    Service(i64),
    Metric(i64),
    Event(i64),
    /// A range query matched no measurements.
    Rows,
}

impl fmt::Display for Missing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Service(id) => write!(f, "service {id}"),
            Self::Metric(id) => write!(f, "metric {id}"),
            Self::Event(id) => write!(f, "event {id}"),
            Self::Rows => f.write_str("metric values in range"),
        }
    }
}

/// Errors that can occur in the storage layer.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Entity failed validation and was not persisted.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Referenced entity does not exist, or a range query matched nothing.
    #[error("record not found: {0}")]
    NotFound(Missing),

    /// Metric declares a type outside the supported set.
    #[error("unknown metric type: {0:?}")]
    UnknownMetricType(String),

    /// Stored value does not parse as the metric's declared type.
    #[error("coercion error: {0}")]
    Coercion(#[from] CoercionError),

    /// Database operation failed (sqlx error).
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Invalid data in database (e.g., out-of-range timestamp).
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// Internal error (e.g., poisoned lock).
    #[error("internal error: {0}")]
    Internal(String),
}

impl StorageError {
    /// True for both a missing entity and an empty range query.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Map a foreign key violation to the entity it points at.
    pub(crate) fn from_sqlx_ref(err: sqlx::Error, missing: Missing) -> Self {
        match &err {
            sqlx::Error::Database(db) if db.is_foreign_key_violation() => Self::NotFound(missing),
            _ => Self::Database(err),
        }
    }
}

/// Result alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;
