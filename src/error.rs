//! Error types for stores, codecs and cells

use thiserror::Error;

/// Failure reported by a [`KeyValueStore`](crate::platform::KeyValueStore)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The store cannot be reached (no browser context, storage disabled, ...)
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// The store refused the write because it is full
    #[error("quota exceeded writing '{key}'")]
    QuotaExceeded { key: String },
}

/// Failure converting a value to or from its stored string form
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("encode failed: {0}")]
    Encode(String),

    #[error("decode failed: {0}")]
    Decode(String),
}

/// Failure constructing a [`PersistedCell`](crate::persistence::PersistedCell)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CellError {
    #[error("cell key must not be empty")]
    EmptyKey,

    /// The backing store could not be read at construction
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),
}

impl From<StoreError> for CellError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Unavailable(reason) => CellError::StoreUnavailable(reason),
            // A read never hits the quota, but keep the reason if a store says so
            other => CellError::StoreUnavailable(other.to_string()),
        }
    }
}

/// What went wrong during a write-back
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WriteFailure {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Codec(#[from] CodecError),
}

/// A failed write-back, delivered on the cell's error channel
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("write-back of '{key}' failed: {failure}")]
pub struct WriteError {
    pub key: String,
    pub failure: WriteFailure,
}

impl WriteError {
    /// True if the store ran out of space
    pub fn is_quota_exceeded(&self) -> bool {
        matches!(
            self.failure,
            WriteFailure::Store(StoreError::QuotaExceeded { .. })
        )
    }
}
