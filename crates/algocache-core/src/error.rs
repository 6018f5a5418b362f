//! Error types surfaced by the sync layer.

use thiserror::Error;

use crate::api::SourceError;
use crate::models::EntityKind;

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Cache I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cache serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Cache is corrupt: {0}")]
    Corrupt(String),
}

#[derive(Error, Debug)]
pub enum SyncError {
    /// The source is unreachable and nothing has ever been cached for this kind.
    #[error("No connection and nothing saved for {kind}. Check your internet connection and try again.")]
    Offline { kind: EntityKind },

    #[error("No {kind} record with id {id}")]
    NotFound { kind: EntityKind, id: String },

    #[error(transparent)]
    Source(SourceError),

    #[error(transparent)]
    Cache(#[from] CacheError),
}

impl SyncError {
    /// Map a source failure on the critical path. Terminal not-found keeps its
    /// identity so callers can tell "gone" from "broken".
    pub(crate) fn from_source(kind: EntityKind, id: Option<String>, error: SourceError) -> Self {
        match (error, id) {
            (SourceError::NotFound(_), Some(id)) => SyncError::NotFound { kind, id },
            (error, _) => SyncError::Source(error),
        }
    }

    pub fn is_offline(&self) -> bool {
        matches!(self, SyncError::Offline { .. })
    }
}

pub type SyncResult<T> = std::result::Result<T, SyncError>;
