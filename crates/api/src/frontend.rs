//! Static frontend bundle.

use std::path::Path;

use axum::{Router, routing::get};
use tower_http::services::{ServeDir, ServeFile};
use tracing::{info, warn};

/// Body of `GET /` when no bundle is present.
pub const NOT_BUILT_MESSAGE: &str = "ShareSafely API - frontend not built.";

async fn not_built() -> &'static str {
    NOT_BUILT_MESSAGE
}

/// Serve `static_dir` for every path the API does not handle.
///
/// Unknown paths get `index.html` so client-side routing works. Without a
/// bundle only `GET /` answers, with a plain-text notice.
pub fn mount(router: Router, static_dir: &Path) -> Router {
    let index = static_dir.join("index.html");
    if index.is_file() {
        info!(dir = %static_dir.display(), "Serving frontend bundle");
        router.fallback_service(ServeDir::new(static_dir).fallback(ServeFile::new(index)))
    } else {
        warn!(dir = %static_dir.display(), "Frontend bundle not found");
        router.route("/", get(not_built))
    }
}
