//! Storage configuration types.

use std::fmt;
use std::sync::Arc;

use super::sas::SigningMode;
use crate::identity::TokenCredential;

/// How the service authenticates to the storage account.
#[derive(Clone)]
pub enum StorageAuth {
    /// Long-lived account key (base64, as shown in the portal).
    SharedKey {
        /// Base64 encoded account key.
        access_key: String,
    },
    /// Ambient Entra ID identity; links are co-signed with a user delegation key.
    Identity(Arc<dyn TokenCredential>),
}

impl StorageAuth {
    /// Create shared key auth.
    #[must_use]
    pub fn shared_key(access_key: impl Into<String>) -> Self {
        Self::SharedKey {
            access_key: access_key.into(),
        }
    }

    /// Signing mode this auth selects.
    #[must_use]
    pub const fn signing_mode(&self) -> SigningMode {
        match self {
            Self::SharedKey { .. } => SigningMode::SharedKey,
            Self::Identity(_) => SigningMode::Delegated,
        }
    }
}

impl fmt::Debug for StorageAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SharedKey { .. } => f
                .debug_struct("SharedKey")
                .field("access_key", &"<redacted>")
                .finish(),
            Self::Identity(_) => f.debug_tuple("Identity").finish_non_exhaustive(),
        }
    }
}

/// Storage service configuration.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Storage account name.
    pub account: String,
    /// Container holding uploaded objects.
    pub container: String,
    /// Blob endpoint override; defaults to `https://{account}.blob.core.windows.net`.
    pub endpoint: Option<String>,
    /// Authentication.
    pub auth: StorageAuth,
}

impl StorageConfig {
    /// Default container name.
    pub const DEFAULT_CONTAINER: &'static str = "sharesafely";

    /// Create a new storage config with the default container.
    #[must_use]
    pub fn new(account: impl Into<String>, auth: StorageAuth) -> Self {
        Self {
            account: account.into(),
            container: Self::DEFAULT_CONTAINER.to_string(),
            endpoint: None,
            auth,
        }
    }

    /// Set the container name.
    #[must_use]
    pub fn with_container(mut self, container: impl Into<String>) -> Self {
        self.container = container.into();
        self
    }

    /// Set the blob endpoint override.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: Option<String>) -> Self {
        self.endpoint = endpoint;
        self
    }

    /// Blob service base URL without a trailing slash.
    #[must_use]
    pub fn blob_endpoint(&self) -> String {
        self.endpoint.as_deref().map_or_else(
            || format!("https://{}.blob.core.windows.net", self.account),
            |endpoint| endpoint.trim_end_matches('/').to_string(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_endpoint_and_container() {
        let config = StorageConfig::new("shareacct", StorageAuth::shared_key("a2V5"));
        assert_eq!(config.container, "sharesafely");
        assert_eq!(
            config.blob_endpoint(),
            "https://shareacct.blob.core.windows.net"
        );
        assert_eq!(config.auth.signing_mode(), SigningMode::SharedKey);
    }

    #[test]
    fn test_endpoint_override_is_trimmed() {
        let config = StorageConfig::new("devstoreaccount1", StorageAuth::shared_key("a2V5"))
            .with_container("uploads")
            .with_endpoint(Some("http://127.0.0.1:10000/devstoreaccount1/".into()));
        assert_eq!(
            config.blob_endpoint(),
            "http://127.0.0.1:10000/devstoreaccount1"
        );
        assert_eq!(config.container, "uploads");
    }

    #[test]
    fn test_debug_redacts_key() {
        let config = StorageConfig::new("shareacct", StorageAuth::shared_key("c2VjcmV0"));
        let debug = format!("{config:?}");
        assert!(!debug.contains("c2VjcmV0"));
        assert!(debug.contains("<redacted>"));
    }
}
