//! File upload endpoint.

use axum::{
    Json, Router,
    extract::{
        DefaultBodyLimit, Multipart, State,
        multipart::{MultipartError, MultipartRejection},
    },
    http::StatusCode,
    routing::post,
};
use bytes::BytesMut;
use serde::Serialize;
use tracing::{error, warn};

use sharesafely_core::upload::{IncomingFile, UploadError};
use sharesafely_shared::AppError;

use crate::{AppState, error::ApiError};

/// Multipart field carrying the file.
pub const FILE_FIELD: &str = "file";

/// Allowance for boundaries, part headers and small text fields on top of
/// the file size ceiling.
pub const MULTIPART_OVERHEAD_BYTES: u64 = 64 * 1024;

/// Response for a successful upload.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    /// Object name to request a link for.
    pub blob_name: String,
    /// Always `"Uploaded"`.
    pub message: &'static str,
}

/// Creates upload routes.
pub fn routes(max_upload_bytes: u64) -> Router<AppState> {
    let body_limit = usize::try_from(max_upload_bytes.saturating_add(MULTIPART_OVERHEAD_BYTES))
        .unwrap_or(usize::MAX);
    Router::new()
        .route("/upload", post(upload_file))
        .layer(DefaultBodyLimit::max(body_limit))
}

fn multipart_error(err: &MultipartError, max: u64) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        UploadError::TooLarge { max }.into()
    } else {
        AppError::Validation(format!("Invalid multipart body: {}", err.body_text())).into()
    }
}

/// POST /upload
async fn upload_file(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>, ApiError> {
    let mut multipart = multipart.map_err(|rejection| {
        AppError::Validation(format!("Invalid multipart body: {}", rejection.body_text()))
    })?;
    let max = state.uploads.max_size();

    let mut file: Option<IncomingFile> = None;
    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(&e, max))?
    {
        // Text fields and parts with no or an empty filename are not files.
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let Some(original_name) = field
            .file_name()
            .filter(|name| !name.is_empty())
            .map(str::to_string)
        else {
            continue;
        };
        if file.is_some() {
            return Err(
                AppError::Validation("Only one file may be uploaded per request".into()).into(),
            );
        }
        let content_type = field.content_type().map(str::to_string);

        let mut buf = BytesMut::new();
        while let Some(chunk) = field.chunk().await.map_err(|e| multipart_error(&e, max))? {
            if (buf.len() + chunk.len()) as u64 > max {
                warn!(
                    file_name = %original_name,
                    max,
                    "Upload exceeded size ceiling"
                );
                return Err(UploadError::TooLarge { max }.into());
            }
            buf.extend_from_slice(&chunk);
        }

        file = Some(IncomingFile {
            original_name,
            content_type,
            bytes: buf.freeze(),
        });
    }

    let Some(file) = file else {
        return Err(AppError::Validation("No file provided".into()).into());
    };

    let stored = state.uploads.upload(file).await.map_err(|e| {
        error!(error = %e, "Upload failed");
        ApiError::from(e)
    })?;

    Ok(Json(UploadResponse {
        blob_name: stored.blob_name,
        message: "Uploaded",
    }))
}
