//! Shared helpers for router tests.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use axum::{Router, body::Body, http::Request, response::Response};
use bytes::Bytes;
use http_body_util::BodyExt;
use sharesafely_core::storage::{
    BlobSasPermissions, ObjectStore, ScopedCredential, SigningMode, StorageError, ValidityWindow,
};

use crate::{AppState, create_router};

pub(crate) const BOUNDARY: &str = "sharesafely-test-boundary";

/// Counts calls; optionally fails every one.
#[derive(Default)]
pub(crate) struct FakeStore {
    pub(crate) puts: AtomicUsize,
    pub(crate) signs: AtomicUsize,
    pub(crate) fail_with: Option<&'static str>,
}

impl FakeStore {
    pub(crate) fn put_count(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }

    pub(crate) fn sign_count(&self) -> usize {
        self.signs.load(Ordering::SeqCst)
    }

    fn failure(&self, operation: &'static str) -> Result<(), StorageError> {
        match self.fail_with {
            Some(message) => Err(StorageError::Service {
                operation,
                status: 403,
                code: Some("AuthorizationFailure".into()),
                message: message.into(),
            }),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ObjectStore for FakeStore {
    fn base_url(&self) -> &str {
        "https://shareacct.blob.core.windows.net"
    }

    fn container(&self) -> &str {
        "sharesafely"
    }

    fn signing_mode(&self) -> SigningMode {
        SigningMode::Delegated
    }

    async fn put_object(
        &self,
        name: &str,
        _bytes: Bytes,
        _content_type: &str,
    ) -> Result<String, StorageError> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        self.failure("put blob")?;
        Ok(name.to_string())
    }

    async fn issue_scoped_credential(
        &self,
        _name: &str,
        permissions: BlobSasPermissions,
        window: &ValidityWindow,
    ) -> Result<ScopedCredential, StorageError> {
        self.signs.fetch_add(1, Ordering::SeqCst);
        self.failure("get user delegation key")?;
        Ok(ScopedCredential {
            query: format!("sv=2022-11-02&sr=b&sp={}&sig=test", permissions.as_str()),
            starts_on: window.starts_on(),
            expires_on: window.expires_on(),
            permissions,
        })
    }
}

pub(crate) fn app(store: Arc<FakeStore>, max_upload_bytes: u64) -> Router {
    let state = AppState::new(store, 60, max_upload_bytes);
    create_router(state, Path::new("/nonexistent/sharesafely/dist"))
}

/// One multipart part.
pub(crate) struct Part {
    name: String,
    filename: Option<String>,
    content_type: Option<String>,
    content: Vec<u8>,
}

/// A `file` part with a filename.
pub(crate) fn file_part(filename: &str, content_type: Option<&str>, content: &[u8]) -> Part {
    Part {
        name: "file".to_string(),
        filename: Some(filename.to_string()),
        content_type: content_type.map(str::to_string),
        content: content.to_vec(),
    }
}

/// A part without a filename.
pub(crate) fn text_part(name: &str, content: &str) -> Part {
    Part {
        name: name.to_string(),
        filename: None,
        content_type: None,
        content: content.as_bytes().to_vec(),
    }
}

pub(crate) fn multipart_request(parts: &[Part]) -> Request<Body> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        let disposition = match &part.filename {
            Some(filename) => format!(
                "Content-Disposition: form-data; name=\"{}\"; filename=\"{filename}\"\r\n",
                part.name
            ),
            None => format!("Content-Disposition: form-data; name=\"{}\"\r\n", part.name),
        };
        body.extend_from_slice(disposition.as_bytes());
        if let Some(content_type) = &part.content_type {
            body.extend_from_slice(format!("Content-Type: {content_type}\r\n").as_bytes());
        }
        body.extend_from_slice(b"\r\n");
        body.extend_from_slice(&part.content);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri("/api/upload")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

pub(crate) async fn json_body(response: Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
