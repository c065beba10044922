//! Link issuance service.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use sharesafely_shared::{MAX_SAS_TTL_MINUTES, MIN_SAS_TTL_MINUTES};

use super::error::LinkError;
use crate::storage::{BlobSasPermissions, ObjectStore, ValidityWindow, encode_blob_name};

/// A shareable, read-only URL and its validity window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedLink {
    /// Blob URL with the SAS query appended.
    pub url: String,
    /// Start of validity.
    pub starts_on: DateTime<Utc>,
    /// End of validity.
    pub expires_on: DateTime<Utc>,
}

/// Issues time-limited read links for stored objects.
#[derive(Clone)]
pub struct LinkService {
    store: Arc<dyn ObjectStore>,
    default_ttl_minutes: u32,
}

impl LinkService {
    /// Create a link service over `store`.
    pub fn new(store: Arc<dyn ObjectStore>, default_ttl_minutes: u32) -> Self {
        Self {
            store,
            default_ttl_minutes,
        }
    }

    /// TTL used when the caller does not pick one.
    pub const fn default_ttl_minutes(&self) -> u32 {
        self.default_ttl_minutes
    }

    /// Issue a read-only link to `object_name` valid for `ttl_minutes` from now.
    ///
    /// The object is not looked up first; a link for a missing object is
    /// still issued and fails only when fetched.
    pub async fn issue_link(
        &self,
        object_name: &str,
        ttl_minutes: i64,
    ) -> Result<IssuedLink, LinkError> {
        if object_name.is_empty() {
            return Err(LinkError::EmptyObjectName);
        }
        if !(i64::from(MIN_SAS_TTL_MINUTES)..=i64::from(MAX_SAS_TTL_MINUTES)).contains(&ttl_minutes)
        {
            return Err(LinkError::TtlOutOfRange {
                got: ttl_minutes,
                min: MIN_SAS_TTL_MINUTES,
                max: MAX_SAS_TTL_MINUTES,
            });
        }

        let window = ValidityWindow::starting_now(Duration::minutes(ttl_minutes));
        let credential = self
            .store
            .issue_scoped_credential(object_name, BlobSasPermissions::read_only(), &window)
            .await?;

        let url = format!(
            "{}/{}/{}?{}",
            self.store.base_url(),
            self.store.container(),
            encode_blob_name(object_name),
            credential.query
        );

        debug!(
            blob_name = %object_name,
            ttl_minutes,
            expires_on = %credential.expires_on,
            "Issued read link"
        );

        Ok(IssuedLink {
            url,
            starts_on: credential.starts_on,
            expires_on: credential.expires_on,
        })
    }
}
