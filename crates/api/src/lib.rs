//! HTTP API layer with Axum routes.
//!
//! This crate provides:
//! - `POST /api/upload` and `GET /api/sas`
//! - The JSON error envelope
//! - Static frontend serving with SPA fallback
//! - Security response headers

pub mod error;
pub mod frontend;
pub mod routes;
pub mod security;

#[cfg(test)]
mod test_support;

use std::path::Path;
use std::sync::Arc;

use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use sharesafely_core::link::LinkService;
use sharesafely_core::storage::ObjectStore;
use sharesafely_core::upload::UploadService;

pub use error::ApiError;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Object store handle, shared by both services.
    pub store: Arc<dyn ObjectStore>,
    /// Read link issuance.
    pub links: LinkService,
    /// Upload handling.
    pub uploads: UploadService,
}

impl AppState {
    /// Build state around one store handle.
    pub fn new(store: Arc<dyn ObjectStore>, default_ttl_minutes: u32, max_upload_bytes: u64) -> Self {
        Self {
            links: LinkService::new(Arc::clone(&store), default_ttl_minutes),
            uploads: UploadService::new(Arc::clone(&store), max_upload_bytes),
            store,
        }
    }
}

/// Creates the main application router.
pub fn create_router(state: AppState, static_dir: &Path) -> Router {
    let max_upload_bytes = state.uploads.max_size();
    let router = Router::new()
        .nest("/api", routes::api_routes(max_upload_bytes))
        .with_state(state);

    security::harden(frontend::mount(router, static_dir))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
}
