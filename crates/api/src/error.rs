//! JSON error envelope.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tracing::error;

use sharesafely_core::link::LinkError;
use sharesafely_core::upload::UploadError;
use sharesafely_shared::AppError;

/// `{ "error": ..., "details"?: ... }`
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Short description.
    pub error: String,
    /// Underlying cause, when there is one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Handler error rendered as the JSON envelope.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl From<LinkError> for ApiError {
    fn from(err: LinkError) -> Self {
        Self(err.into())
    }
}

impl From<UploadError> for ApiError {
    fn from(err: UploadError) -> Self {
        Self(err.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if status.is_server_error() {
            error!(code = self.0.error_code(), error = %self.0, "Request failed");
        }

        let body = ErrorBody {
            error: self.0.envelope_message(),
            details: self.0.envelope_details().map(str::to_string),
        };
        (status, Json(body)).into_response()
    }
}
