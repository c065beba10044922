//! API route definitions.

use axum::Router;

use crate::AppState;

pub mod health;
pub mod sas;
pub mod upload;

/// Creates the `/api` router.
pub fn api_routes(max_upload_bytes: u64) -> Router<AppState> {
    Router::new()
        .merge(health::routes())
        .merge(upload::routes(max_upload_bytes))
        .merge(sas::routes())
}
