//! Object store abstraction and the Azure Blob implementation.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use tracing::{debug, info};

use super::client::{BlobAuth, BlobServiceClient, SharedKeyCredential};
use super::config::{StorageAuth, StorageConfig};
use super::error::StorageError;
use super::sas::{
    BlobSasPermissions, DelegatedSigner, SasScope, SasSigner, ScopedCredential, SharedKeySigner,
    SigningMode, ValidityWindow,
};

/// Put objects and mint scoped read credentials for them.
///
/// Injected into request handlers as `Arc<dyn ObjectStore>` so tests can
/// substitute a fake.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Blob service base URL, no trailing slash.
    fn base_url(&self) -> &str;

    /// Container holding uploaded objects.
    fn container(&self) -> &str;

    /// Signing identity in use.
    fn signing_mode(&self) -> SigningMode;

    /// Store `bytes` under `name`. Returns the stored name.
    async fn put_object(
        &self,
        name: &str,
        bytes: Bytes,
        content_type: &str,
    ) -> Result<String, StorageError>;

    /// Sign a credential for `name` over `window`. Does not check that the object exists.
    async fn issue_scoped_credential(
        &self,
        name: &str,
        permissions: BlobSasPermissions,
        window: &ValidityWindow,
    ) -> Result<ScopedCredential, StorageError>;
}

/// Outcome of the startup container check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerStatus {
    /// The container was already there.
    Verified,
    /// The container was missing and has been created.
    Created,
}

/// Azure Blob Storage backed object store.
pub struct AzureBlobStore {
    client: Arc<BlobServiceClient>,
    container: String,
    signer: SasSigner,
}

impl AzureBlobStore {
    /// Build the store without contacting the service.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the account name is empty or the
    /// shared key is not valid base64.
    pub fn connect(config: &StorageConfig, http: reqwest::Client) -> Result<Self, StorageError> {
        if config.account.trim().is_empty() {
            return Err(StorageError::configuration("storage account name is empty"));
        }
        let endpoint = config.blob_endpoint();

        let (client, signer) = match &config.auth {
            StorageAuth::SharedKey { access_key } => {
                let credential = Arc::new(SharedKeyCredential::new(&config.account, access_key)?);
                let client = Arc::new(BlobServiceClient::new(
                    http,
                    endpoint,
                    &config.account,
                    BlobAuth::SharedKey(Arc::clone(&credential)),
                ));
                (client, SasSigner::SharedKey(SharedKeySigner::new(credential)))
            }
            StorageAuth::Identity(credential) => {
                let client = Arc::new(BlobServiceClient::new(
                    http,
                    endpoint,
                    &config.account,
                    BlobAuth::Bearer(Arc::clone(credential)),
                ));
                let signer = SasSigner::Delegated(DelegatedSigner::new(Arc::clone(&client)));
                (client, signer)
            }
        };

        Ok(Self {
            client,
            container: config.container.clone(),
            signer,
        })
    }

    /// Build the store and make sure its container exists.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for bad settings, or the storage error
    /// from the container check or create.
    pub async fn initialize(
        config: &StorageConfig,
        http: reqwest::Client,
    ) -> Result<Self, StorageError> {
        let store = Self::connect(config, http)?;
        info!(
            account = %config.account,
            container = %store.container,
            signing = %store.signer.mode(),
            "Using {} credentials for blob storage",
            store.signer.mode()
        );

        match store.ensure_container().await? {
            ContainerStatus::Verified => {
                info!(container = %store.container, "Container verified");
            }
            ContainerStatus::Created => {
                info!(container = %store.container, "Container created");
            }
        }
        Ok(store)
    }

    /// Create the container with private access if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns the storage error from either request.
    pub async fn ensure_container(&self) -> Result<ContainerStatus, StorageError> {
        if self.client.container_exists(&self.container).await? {
            return Ok(ContainerStatus::Verified);
        }
        // 409 here means someone else won the race, which is fine.
        let created = self.client.create_container(&self.container).await?;
        debug!(container = %self.container, created, "Container create finished");
        Ok(ContainerStatus::Created)
    }
}

#[async_trait]
impl ObjectStore for AzureBlobStore {
    fn base_url(&self) -> &str {
        self.client.endpoint()
    }

    fn container(&self) -> &str {
        &self.container
    }

    fn signing_mode(&self) -> SigningMode {
        self.signer.mode()
    }

    async fn put_object(
        &self,
        name: &str,
        bytes: Bytes,
        content_type: &str,
    ) -> Result<String, StorageError> {
        let size = bytes.len();
        self.client
            .put_blob(&self.container, name, bytes, content_type)
            .await?;
        debug!(blob_name = %name, size, content_type, "Blob stored");
        Ok(name.to_string())
    }

    async fn issue_scoped_credential(
        &self,
        name: &str,
        permissions: BlobSasPermissions,
        window: &ValidityWindow,
    ) -> Result<ScopedCredential, StorageError> {
        let scope = SasScope {
            container: &self.container,
            blob: name,
            permissions,
        };
        self.signer.sign(&scope, window).await
    }
}
