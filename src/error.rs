//! Error types for the persistence layer.

use thiserror::Error;

use crate::persistence::Partition;

/// Failure raised by a key-value backend.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("quota exceeded writing {key}: needs {needed} bytes, capacity is {capacity}")]
    QuotaExceeded {
        key: String,
        needed: usize,
        capacity: usize,
    },

    #[error("storage unavailable: {0}")]
    Unavailable(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failure of a manager operation.
///
/// The plain manager methods recover from these (returning empty or
/// default values, or `false`); the `try_*` variants hand them to the caller
/// so "absent" can be told apart from "corrupt".
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("nothing stored under {0}")]
    Missing(Partition),

    #[error("stored {partition} payload is malformed: {source}")]
    Corrupt {
        partition: Partition,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode payload: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("{0} payload must be a JSON object")]
    NotAnObject(Partition),

    #[error("{field} is {value}, which JSON cannot store")]
    NonFinite { field: String, value: f64 },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("failed to schedule deferred write: {0}")]
    Schedule(String),
}

impl PersistError {
    /// True when the partition simply has never been written.
    pub fn is_missing(&self) -> bool {
        matches!(self, PersistError::Missing(_))
    }
}

/// Result type for persistence operations.
pub type Result<T> = std::result::Result<T, PersistError>;
