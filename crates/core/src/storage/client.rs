//! Minimal Azure Blob REST client.
//!
//! Only the calls the service needs: container properties/creation, Put Blob
//! and Get User Delegation Key. Requests are authorized either with Shared Key
//! or with an Entra ID bearer token.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::SystemTime;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use reqwest::header::{AUTHORIZATION, HeaderValue};
use reqwest::StatusCode;
use sha2::Sha256;
use tracing::debug;
use uuid::Uuid;

use super::error::StorageError;
use super::sas::format_sas_time;
use crate::identity::TokenCredential;

/// REST API version sent with every request.
pub const API_VERSION: &str = "2022-11-02";

/// Characters left alone by JavaScript's `encodeURIComponent`.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Percent-encode a blob name for use as a single URL path segment.
#[must_use]
pub fn encode_blob_name(name: &str) -> String {
    utf8_percent_encode(name, COMPONENT).to_string()
}

/// HMAC-SHA256 over `data`, base64 encoded.
pub(crate) fn hmac_sha256_base64(key: &[u8], data: &str) -> Result<String, StorageError> {
    let mut mac = Hmac::<Sha256>::new_from_slice(key)
        .map_err(|e| StorageError::Signing(format!("HMAC key error: {e}")))?;
    mac.update(data.as_bytes());
    Ok(BASE64_STANDARD.encode(mac.finalize().into_bytes()))
}

/// Storage account name plus its decoded shared key.
pub struct SharedKeyCredential {
    account: String,
    key: Vec<u8>,
}

impl SharedKeyCredential {
    /// Decode a base64 account key.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the key is not valid base64.
    pub fn new(account: impl Into<String>, access_key: &str) -> Result<Self, StorageError> {
        let key = BASE64_STANDARD.decode(access_key.trim()).map_err(|e| {
            StorageError::configuration(format!("account key is not valid base64: {e}"))
        })?;
        Ok(Self {
            account: account.into(),
            key,
        })
    }

    /// Account the key belongs to.
    #[must_use]
    pub fn account(&self) -> &str {
        &self.account
    }

    /// Sign a string-to-sign with the account key.
    pub fn sign(&self, string_to_sign: &str) -> Result<String, StorageError> {
        hmac_sha256_base64(&self.key, string_to_sign)
    }
}

/// Request authorization used by the client.
#[derive(Clone)]
pub enum BlobAuth {
    /// `Authorization: SharedKey {account}:{signature}`.
    SharedKey(Arc<SharedKeyCredential>),
    /// `Authorization: Bearer {token}` for the storage scope.
    Bearer(Arc<dyn TokenCredential>),
}

/// Key returned by Get User Delegation Key.
///
/// The `signed_*` values are echoed back verbatim into the SAS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserDelegationKey {
    /// Object id of the principal the key was issued to.
    pub signed_oid: String,
    /// Tenant of that principal.
    pub signed_tid: String,
    /// Key validity start.
    pub signed_start: String,
    /// Key validity end.
    pub signed_expiry: String,
    /// Service the key is valid for (`b`).
    pub signed_service: String,
    /// REST version used to obtain the key.
    pub signed_version: String,
    /// Base64 key material.
    pub value: String,
}

/// Blob service REST client for one storage account.
pub struct BlobServiceClient {
    http: reqwest::Client,
    endpoint: String,
    account: String,
    auth: BlobAuth,
}

impl BlobServiceClient {
    /// Create a client for `endpoint` (no trailing slash).
    #[must_use]
    pub fn new(
        http: reqwest::Client,
        endpoint: impl Into<String>,
        account: impl Into<String>,
        auth: BlobAuth,
    ) -> Self {
        Self {
            http,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            account: account.into(),
            auth,
        }
    }

    /// Blob service base URL.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Storage account name.
    #[must_use]
    pub fn account(&self) -> &str {
        &self.account
    }

    fn container_url(&self, container: &str) -> String {
        format!("{}/{container}", self.endpoint)
    }

    fn blob_url(&self, container: &str, blob: &str) -> String {
        format!("{}/{container}/{}", self.endpoint, encode_blob_name(blob))
    }

    /// Get Container Properties; `false` on 404.
    pub async fn container_exists(&self, container: &str) -> Result<bool, StorageError> {
        const OP: &str = "get container properties";
        let request = self
            .http
            .get(self.container_url(container))
            .query(&[("restype", "container")]);

        let response = self.send(OP, request).await?;
        match response.status() {
            status if status.is_success() => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            _ => Err(service_error(OP, response).await),
        }
    }

    /// Create Container with private access; `false` if it already existed.
    pub async fn create_container(&self, container: &str) -> Result<bool, StorageError> {
        const OP: &str = "create container";
        let request = self
            .http
            .put(self.container_url(container))
            .query(&[("restype", "container")])
            .body(Bytes::new());

        let response = self.send(OP, request).await?;
        match response.status() {
            status if status.is_success() => Ok(true),
            StatusCode::CONFLICT => Ok(false),
            _ => Err(service_error(OP, response).await),
        }
    }

    /// Put Blob as a single block blob.
    pub async fn put_blob(
        &self,
        container: &str,
        name: &str,
        bytes: Bytes,
        content_type: &str,
    ) -> Result<(), StorageError> {
        const OP: &str = "put blob";
        let request = self
            .http
            .put(self.blob_url(container, name))
            .header("x-ms-blob-type", "BlockBlob")
            .header("x-ms-blob-content-type", content_type)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(bytes);

        let response = self.send(OP, request).await?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(service_error(OP, response).await)
        }
    }

    /// Get User Delegation Key for `[start, expiry]`. Bearer auth only.
    pub async fn get_user_delegation_key(
        &self,
        start: DateTime<Utc>,
        expiry: DateTime<Utc>,
    ) -> Result<UserDelegationKey, StorageError> {
        const OP: &str = "get user delegation key";
        let body = format!(
            "<?xml version=\"1.0\" encoding=\"utf-8\"?><KeyInfo><Start>{}</Start><Expiry>{}</Expiry></KeyInfo>",
            format_sas_time(start),
            format_sas_time(expiry)
        );
        let request = self
            .http
            .post(format!("{}/", self.endpoint))
            .query(&[("restype", "service"), ("comp", "userdelegationkey")])
            .header(reqwest::header::CONTENT_TYPE, "application/xml")
            .body(body);

        let response = self.send(OP, request).await?;
        if !response.status().is_success() {
            return Err(service_error(OP, response).await);
        }

        let text = response
            .text()
            .await
            .map_err(|e| StorageError::transport(OP, e.to_string()))?;
        parse_user_delegation_key(&text)
    }

    /// Stamp common headers, authorize and execute.
    async fn send(
        &self,
        operation: &'static str,
        builder: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, StorageError> {
        let mut request = builder
            .header("x-ms-date", httpdate::fmt_http_date(SystemTime::now()))
            .header("x-ms-version", API_VERSION)
            .header("x-ms-client-request-id", Uuid::new_v4().to_string())
            .build()
            .map_err(|e| StorageError::transport(operation, e.to_string()))?;

        let authorization = match &self.auth {
            BlobAuth::SharedKey(credential) => {
                let string_to_sign = shared_key_string_to_sign(&request, credential.account());
                format!(
                    "SharedKey {}:{}",
                    credential.account(),
                    credential.sign(&string_to_sign)?
                )
            }
            BlobAuth::Bearer(credential) => {
                format!("Bearer {}", credential.get_token().await?)
            }
        };
        let value = HeaderValue::from_str(&authorization)
            .map_err(|e| StorageError::Signing(format!("invalid authorization header: {e}")))?;
        request.headers_mut().insert(AUTHORIZATION, value);

        debug!(
            operation,
            method = %request.method(),
            url = %request.url().path(),
            "Sending blob service request"
        );

        self.http
            .execute(request)
            .await
            .map_err(|e| StorageError::transport(operation, e.to_string()))
    }
}

/// Shared Key string-to-sign for a built request (version 2015-02-21 and later).
fn shared_key_string_to_sign(request: &reqwest::Request, account: &str) -> String {
    let headers = request.headers();
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
    };

    let content_length = request
        .body()
        .and_then(reqwest::Body::as_bytes)
        .map_or(0, <[u8]>::len);
    let content_length = if content_length == 0 {
        String::new()
    } else {
        content_length.to_string()
    };

    let mut ms_headers: Vec<(&str, &str)> = headers
        .iter()
        .filter(|(name, _)| name.as_str().starts_with("x-ms-"))
        .map(|(name, value)| (name.as_str(), value.to_str().unwrap_or_default().trim()))
        .collect();
    ms_headers.sort_unstable();
    let canonicalized_headers: String = ms_headers
        .iter()
        .map(|(name, value)| format!("{name}:{value}\n"))
        .collect();

    let mut params: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (key, value) in request.url().query_pairs() {
        params
            .entry(key.to_lowercase())
            .or_default()
            .push(value.into_owned());
    }
    let mut canonicalized_resource = format!("/{account}{}", request.url().path());
    for (key, mut values) in params {
        values.sort();
        canonicalized_resource.push_str(&format!("\n{key}:{}", values.join(",")));
    }

    let verb = request.method().as_str();

    format!(
        "{verb}\n{}\n{}\n{content_length}\n{}\n{}\n\n{}\n{}\n{}\n{}\n{}\n{canonicalized_headers}{canonicalized_resource}",
        header("content-encoding"),
        header("content-language"),
        header("content-md5"),
        header("content-type"),
        header("if-modified-since"),
        header("if-match"),
        header("if-none-match"),
        header("if-unmodified-since"),
        header("range"),
    )
}

/// Text content of the first `<tag>` element.
fn xml_text<'a>(body: &'a str, tag: &str) -> Option<&'a str> {
    let open = format!("<{tag}>");
    let close = format!("</{tag}>");
    let start = body.find(&open)? + open.len();
    let end = body[start..].find(&close)? + start;
    Some(&body[start..end])
}

fn parse_user_delegation_key(body: &str) -> Result<UserDelegationKey, StorageError> {
    let field = |tag: &str| {
        xml_text(body, tag).map(str::to_string).ok_or_else(|| {
            StorageError::unexpected("get user delegation key", format!("missing <{tag}>"))
        })
    };

    Ok(UserDelegationKey {
        signed_oid: field("SignedOid")?,
        signed_tid: field("SignedTid")?,
        signed_start: field("SignedStart")?,
        signed_expiry: field("SignedExpiry")?,
        signed_service: field("SignedService")?,
        signed_version: field("SignedVersion")?,
        value: field("Value")?,
    })
}

/// Turn a non-success response into a `StorageError::Service`.
async fn service_error(operation: &'static str, response: reqwest::Response) -> StorageError {
    let status = response.status();
    let header_code = response
        .headers()
        .get("x-ms-error-code")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let body = response.text().await.unwrap_or_default();

    let code = header_code.or_else(|| xml_text(&body, "Code").map(str::to_string));
    let message = xml_text(&body, "Message")
        .and_then(|m| m.lines().next())
        .map(str::to_string)
        .or_else(|| (!body.trim().is_empty()).then(|| body.trim().to_string()))
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown").to_string());

    StorageError::Service {
        operation,
        status: status.as_u16(),
        code,
        message,
    }
}
