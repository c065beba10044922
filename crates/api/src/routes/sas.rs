//! Read link endpoint.

use axum::{
    Json, Router,
    extract::{Query, State, rejection::QueryRejection},
    routing::get,
};
use chrono::SecondsFormat;
use serde::{Deserialize, Serialize};
use tracing::error;

use sharesafely_shared::AppError;

use crate::{AppState, error::ApiError};

/// Query parameters for `GET /sas`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SasQuery {
    /// Object name returned by the upload endpoint.
    pub blob_name: Option<String>,
    /// Link lifetime in minutes; the configured default when absent.
    pub ttl: Option<String>,
}

/// Response for a link request.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SasResponse {
    /// Shareable URL.
    pub url: String,
    /// Expiry, ISO 8601 with milliseconds.
    pub expires_on: String,
}

/// Creates link routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/sas", get(issue_sas))
}

fn parse_ttl(raw: Option<&str>, default: u32) -> Result<i64, AppError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(i64::from(default)),
        Some(value) => value.parse::<i64>().map_err(|_| {
            AppError::Validation(format!(
                "ttl must be a whole number of minutes, got {value:?}"
            ))
        }),
    }
}

/// GET /sas
async fn issue_sas(
    State(state): State<AppState>,
    query: Result<Query<SasQuery>, QueryRejection>,
) -> Result<Json<SasResponse>, ApiError> {
    let Query(query) = query.map_err(|rejection| {
        AppError::Validation(format!("Invalid query string: {}", rejection.body_text()))
    })?;
    let Some(blob_name) = query.blob_name.filter(|name| !name.is_empty()) else {
        return Err(AppError::Validation("blobName is required".into()).into());
    };
    let ttl = parse_ttl(query.ttl.as_deref(), state.links.default_ttl_minutes())?;

    let link = state.links.issue_link(&blob_name, ttl).await.map_err(|e| {
        error!(blob_name = %blob_name, error = %e, "SAS generation failed");
        ApiError::from(e)
    })?;

    Ok(Json(SasResponse {
        url: link.url,
        expires_on: link.expires_on.to_rfc3339_opts(SecondsFormat::Millis, true),
    }))
}
