//! Upload error types.

use sharesafely_shared::AppError;
use thiserror::Error;

use crate::storage::StorageError;

/// Upload errors.
#[derive(Debug, Error)]
pub enum UploadError {
    /// File is larger than the configured ceiling.
    #[error("file too large: more than {max} bytes")]
    TooLarge {
        /// Ceiling in bytes.
        max: u64,
    },

    /// The store rejected the write.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl From<UploadError> for AppError {
    fn from(err: UploadError) -> Self {
        match err {
            UploadError::TooLarge { max } => Self::PayloadTooLarge {
                message: "File too large".to_string(),
                details: format!("maximum upload size is {max} bytes"),
            },
            UploadError::Storage(e) => Self::backend("upload failed", e.to_string()),
        }
    }
}
