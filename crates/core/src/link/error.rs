//! Link issuance error types.

use sharesafely_shared::AppError;
use thiserror::Error;

use crate::storage::StorageError;

/// Link issuance errors.
#[derive(Debug, Error)]
pub enum LinkError {
    /// No object name supplied.
    #[error("blobName is required")]
    EmptyObjectName,

    /// TTL outside the allowed range.
    #[error("ttl must be between {min} and {max} minutes, got {got}")]
    TtlOutOfRange {
        /// Requested TTL in minutes.
        got: i64,
        /// Smallest allowed TTL.
        min: u32,
        /// Largest allowed TTL.
        max: u32,
    },

    /// Signing or delegation key request failed.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl From<LinkError> for AppError {
    fn from(err: LinkError) -> Self {
        match err {
            LinkError::EmptyObjectName | LinkError::TtlOutOfRange { .. } => {
                Self::Validation(err.to_string())
            }
            LinkError::Storage(e) => Self::backend("SAS generation failed", e.to_string()),
        }
    }
}
