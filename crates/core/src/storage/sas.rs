//! Blob SAS signing: Service SAS with the account key, or User Delegation SAS.

use std::fmt;
use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use chrono::{DateTime, Duration, SubsecRound, Utc};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use tracing::debug;

use super::client::{BlobServiceClient, SharedKeyCredential, UserDelegationKey, hmac_sha256_base64};
use super::error::StorageError;

/// Signed version (`sv`) of every SAS we issue.
pub const SAS_VERSION: &str = "2022-11-02";

/// Unreserved characters stay literal in query values.
const QUERY_VALUE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// SAS timestamps: UTC, whole seconds.
#[must_use]
pub fn format_sas_time(time: DateTime<Utc>) -> String {
    time.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

/// Which signing identity is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SigningMode {
    /// Account key signs SAS tokens directly.
    SharedKey,
    /// A user delegation key, fetched per link, signs SAS tokens.
    Delegated,
}

impl SigningMode {
    /// Stable identifier for logs and health output.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SharedKey => "shared_key",
            Self::Delegated => "delegated",
        }
    }
}

impl fmt::Display for SigningMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SharedKey => f.write_str("shared key"),
            Self::Delegated => f.write_str("delegated identity"),
        }
    }
}

/// Blob SAS permission set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)]
pub struct BlobSasPermissions {
    /// Read content and properties.
    pub read: bool,
    /// Add blocks (append blobs).
    pub add: bool,
    /// Create a new blob.
    pub create: bool,
    /// Write content.
    pub write: bool,
    /// Delete the blob.
    pub delete: bool,
}

impl BlobSasPermissions {
    /// Read-only access.
    #[must_use]
    pub const fn read_only() -> Self {
        Self {
            read: true,
            add: false,
            create: false,
            write: false,
            delete: false,
        }
    }

    /// Permission string in the canonical `racwd` order.
    #[must_use]
    pub fn as_str(&self) -> String {
        [
            (self.read, 'r'),
            (self.add, 'a'),
            (self.create, 'c'),
            (self.write, 'w'),
            (self.delete, 'd'),
        ]
        .iter()
        .filter(|(set, _)| *set)
        .map(|(_, c)| *c)
        .collect()
    }
}

/// `[starts_on, expires_on]`, both on whole seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidityWindow {
    starts_on: DateTime<Utc>,
    expires_on: DateTime<Utc>,
}

impl ValidityWindow {
    /// Window of `ttl` starting at `start` (sub-second part dropped).
    #[must_use]
    pub fn starting_at(start: DateTime<Utc>, ttl: Duration) -> Self {
        let starts_on = start.trunc_subsecs(0);
        Self {
            starts_on,
            expires_on: starts_on + ttl,
        }
    }

    /// Window of `ttl` starting now.
    #[must_use]
    pub fn starting_now(ttl: Duration) -> Self {
        Self::starting_at(Utc::now(), ttl)
    }

    /// Start of validity.
    #[must_use]
    pub const fn starts_on(&self) -> DateTime<Utc> {
        self.starts_on
    }

    /// End of validity.
    #[must_use]
    pub const fn expires_on(&self) -> DateTime<Utc> {
        self.expires_on
    }
}

/// What a SAS grants access to.
#[derive(Debug, Clone, Copy)]
pub struct SasScope<'a> {
    /// Container name.
    pub container: &'a str,
    /// Blob name, unencoded.
    pub blob: &'a str,
    /// Granted permissions.
    pub permissions: BlobSasPermissions,
}

impl SasScope<'_> {
    fn canonicalized_resource(&self, account: &str) -> String {
        format!("/blob/{account}/{}/{}", self.container, self.blob)
    }
}

/// A signed, time-boxed credential for one blob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopedCredential {
    /// Serialized SAS query string, without the leading `?`.
    pub query: String,
    /// Start of validity.
    pub starts_on: DateTime<Utc>,
    /// End of validity.
    pub expires_on: DateTime<Utc>,
    /// Granted permissions.
    pub permissions: BlobSasPermissions,
}

fn encode_query(params: &[(&str, &str)]) -> String {
    params
        .iter()
        .map(|(k, v)| format!("{k}={}", utf8_percent_encode(v, QUERY_VALUE)))
        .collect::<Vec<_>>()
        .join("&")
}

/// Service SAS string-to-sign (version 2020-12-06 and later).
fn service_string_to_sign(
    account: &str,
    scope: &SasScope<'_>,
    permissions: &str,
    start: &str,
    expiry: &str,
) -> String {
    [
        permissions,
        start,
        expiry,
        &scope.canonicalized_resource(account),
        "", // signedIdentifier
        "", // signedIP
        "", // signedProtocol
        SAS_VERSION,
        "b",
        "", // signedSnapshotTime
        "", // signedEncryptionScope
        "", // rscc
        "", // rscd
        "", // rsce
        "", // rscl
        "", // rsct
    ]
    .join("\n")
}

/// User Delegation SAS string-to-sign (version 2020-12-06 and later).
fn user_delegation_string_to_sign(
    account: &str,
    scope: &SasScope<'_>,
    permissions: &str,
    start: &str,
    expiry: &str,
    key: &UserDelegationKey,
) -> String {
    [
        permissions,
        start,
        expiry,
        &scope.canonicalized_resource(account),
        &key.signed_oid,
        &key.signed_tid,
        &key.signed_start,
        &key.signed_expiry,
        &key.signed_service,
        &key.signed_version,
        "", // signedAuthorizedUserObjectId
        "", // signedUnauthorizedUserObjectId
        "", // signedCorrelationId
        "", // signedIP
        "", // signedProtocol
        SAS_VERSION,
        "b",
        "", // signedSnapshotTime
        "", // signedEncryptionScope
        "", // rscc
        "", // rscd
        "", // rsce
        "", // rscl
        "", // rsct
    ]
    .join("\n")
}

/// Signs Service SAS tokens with the account key. Pure and local.
pub struct SharedKeySigner {
    credential: Arc<SharedKeyCredential>,
}

impl SharedKeySigner {
    /// Create a signer over an account key.
    #[must_use]
    pub fn new(credential: Arc<SharedKeyCredential>) -> Self {
        Self { credential }
    }

    /// Sign `scope` for `window`.
    pub fn sign(
        &self,
        scope: &SasScope<'_>,
        window: &ValidityWindow,
    ) -> Result<ScopedCredential, StorageError> {
        let permissions = scope.permissions.as_str();
        let start = format_sas_time(window.starts_on());
        let expiry = format_sas_time(window.expires_on());

        let string_to_sign = service_string_to_sign(
            self.credential.account(),
            scope,
            &permissions,
            &start,
            &expiry,
        );
        let signature = self.credential.sign(&string_to_sign)?;

        let query = encode_query(&[
            ("sv", SAS_VERSION),
            ("st", &start),
            ("se", &expiry),
            ("sr", "b"),
            ("sp", &permissions),
            ("sig", &signature),
        ]);

        Ok(ScopedCredential {
            query,
            starts_on: window.starts_on(),
            expires_on: window.expires_on(),
            permissions: scope.permissions,
        })
    }
}

/// Signs User Delegation SAS tokens with a key fetched for each window.
pub struct DelegatedSigner {
    client: Arc<BlobServiceClient>,
}

impl DelegatedSigner {
    /// Create a signer that fetches delegation keys through `client`.
    #[must_use]
    pub fn new(client: Arc<BlobServiceClient>) -> Self {
        Self { client }
    }

    /// Fetch a delegation key scoped to `window`, then sign `scope` with it.
    pub async fn sign(
        &self,
        scope: &SasScope<'_>,
        window: &ValidityWindow,
    ) -> Result<ScopedCredential, StorageError> {
        let key = self
            .client
            .get_user_delegation_key(window.starts_on(), window.expires_on())
            .await?;
        debug!(
            signed_oid = %key.signed_oid,
            signed_expiry = %key.signed_expiry,
            "Obtained user delegation key"
        );
        sign_with_delegation_key(self.client.account(), &key, scope, window)
    }
}

fn sign_with_delegation_key(
    account: &str,
    key: &UserDelegationKey,
    scope: &SasScope<'_>,
    window: &ValidityWindow,
) -> Result<ScopedCredential, StorageError> {
    let key_bytes = BASE64_STANDARD
        .decode(key.value.trim())
        .map_err(|e| StorageError::Signing(format!("delegation key is not valid base64: {e}")))?;

    let permissions = scope.permissions.as_str();
    let start = format_sas_time(window.starts_on());
    let expiry = format_sas_time(window.expires_on());

    let string_to_sign =
        user_delegation_string_to_sign(account, scope, &permissions, &start, &expiry, key);
    let signature = hmac_sha256_base64(&key_bytes, &string_to_sign)?;

    let query = encode_query(&[
        ("sv", SAS_VERSION),
        ("st", &start),
        ("se", &expiry),
        ("skoid", &key.signed_oid),
        ("sktid", &key.signed_tid),
        ("skt", &key.signed_start),
        ("ske", &key.signed_expiry),
        ("sks", &key.signed_service),
        ("skv", &key.signed_version),
        ("sr", "b"),
        ("sp", &permissions),
        ("sig", &signature),
    ]);

    Ok(ScopedCredential {
        query,
        starts_on: window.starts_on(),
        expires_on: window.expires_on(),
        permissions: scope.permissions,
    })
}

/// The single signing path selected at startup.
pub enum SasSigner {
    /// Account key.
    SharedKey(SharedKeySigner),
    /// User delegation key.
    Delegated(DelegatedSigner),
}

impl SasSigner {
    /// Which identity signs.
    #[must_use]
    pub const fn mode(&self) -> SigningMode {
        match self {
            Self::SharedKey(_) => SigningMode::SharedKey,
            Self::Delegated(_) => SigningMode::Delegated,
        }
    }

    /// Produce a credential for `scope` over `window`.
    pub async fn sign(
        &self,
        scope: &SasScope<'_>,
        window: &ValidityWindow,
    ) -> Result<ScopedCredential, StorageError> {
        match self {
            Self::SharedKey(signer) => signer.sign(scope, window),
            Self::Delegated(signer) => signer.sign(scope, window).await,
        }
    }
}
