//! Upload service.

use std::sync::Arc;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use tracing::{info, warn};

use super::error::UploadError;
use super::naming::object_name;
use crate::storage::ObjectStore;

/// Content type used when the client sends none.
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// A file received from a client.
#[derive(Debug, Clone)]
pub struct IncomingFile {
    /// Filename as sent by the client.
    pub original_name: String,
    /// Content type as sent by the client.
    pub content_type: Option<String>,
    /// File content.
    pub bytes: Bytes,
}

/// A file written to the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    /// Object name in the container.
    pub blob_name: String,
    /// Size in bytes.
    pub size: u64,
    /// Content type recorded on the blob.
    pub content_type: String,
}

/// Names, size-checks and stores uploaded files.
#[derive(Clone)]
pub struct UploadService {
    store: Arc<dyn ObjectStore>,
    max_size: u64,
}

impl UploadService {
    /// Create an upload service with a size ceiling in bytes.
    pub fn new(store: Arc<dyn ObjectStore>, max_size: u64) -> Self {
        Self { store, max_size }
    }

    /// Size ceiling in bytes. A file of exactly this size is accepted.
    pub const fn max_size(&self) -> u64 {
        self.max_size
    }

    /// Fail if `size` is over the ceiling.
    pub fn check_size(&self, size: u64) -> Result<(), UploadError> {
        if size > self.max_size {
            return Err(UploadError::TooLarge { max: self.max_size });
        }
        Ok(())
    }

    /// Store `file` under a fresh object name.
    pub async fn upload(&self, file: IncomingFile) -> Result<StoredObject, UploadError> {
        self.upload_at(file, Utc::now()).await
    }

    /// Store `file` as if ingested at `ingested_at`.
    pub async fn upload_at(
        &self,
        file: IncomingFile,
        ingested_at: DateTime<Utc>,
    ) -> Result<StoredObject, UploadError> {
        let size = file.bytes.len() as u64;
        if let Err(err) = self.check_size(size) {
            warn!(size, max = self.max_size, "Rejected oversized upload");
            return Err(err);
        }

        let name = object_name(&file.original_name, ingested_at);
        let content_type = file
            .content_type
            .filter(|ct| !ct.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string());

        let blob_name = self
            .store
            .put_object(&name, file.bytes, &content_type)
            .await?;

        info!(blob_name = %blob_name, size, content_type = %content_type, "File uploaded");

        Ok(StoredObject {
            blob_name,
            size,
            content_type,
        })
    }
}
