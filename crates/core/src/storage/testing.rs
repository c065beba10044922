//! In-memory `ObjectStore` for unit tests.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use bytes::Bytes;

use super::error::StorageError;
use super::sas::{BlobSasPermissions, ScopedCredential, SigningMode, ValidityWindow};
use super::service::ObjectStore;

/// Records calls and returns canned results.
#[derive(Default)]
pub(crate) struct RecordingStore {
    pub(crate) puts: AtomicUsize,
    pub(crate) signs: AtomicUsize,
    pub(crate) stored: Mutex<Vec<(String, usize, String)>>,
    pub(crate) fail_with: Option<&'static str>,
}

impl RecordingStore {
    pub(crate) fn failing(message: &'static str) -> Self {
        Self {
            fail_with: Some(message),
            ..Self::default()
        }
    }

    fn failure(&self, operation: &'static str) -> Option<StorageError> {
        self.fail_with.map(|message| StorageError::Service {
            operation,
            status: 403,
            code: Some("AuthorizationFailure".into()),
            message: message.into(),
        })
    }
}

#[async_trait]
impl ObjectStore for RecordingStore {
    fn base_url(&self) -> &str {
        "https://shareacct.blob.core.windows.net"
    }

    fn container(&self) -> &str {
        "sharesafely"
    }

    fn signing_mode(&self) -> SigningMode {
        SigningMode::SharedKey
    }

    async fn put_object(
        &self,
        name: &str,
        bytes: Bytes,
        content_type: &str,
    ) -> Result<String, StorageError> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.failure("put blob") {
            return Err(err);
        }
        self.stored
            .lock()
            .expect("lock")
            .push((name.to_string(), bytes.len(), content_type.to_string()));
        Ok(name.to_string())
    }

    async fn issue_scoped_credential(
        &self,
        _name: &str,
        permissions: BlobSasPermissions,
        window: &ValidityWindow,
    ) -> Result<ScopedCredential, StorageError> {
        self.signs.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.failure("get user delegation key") {
            return Err(err);
        }
        Ok(ScopedCredential {
            query: format!("sv=2022-11-02&sp={}&sig=fake", permissions.as_str()),
            starts_on: window.starts_on(),
            expires_on: window.expires_on(),
            permissions,
        })
    }
}
