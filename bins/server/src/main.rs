//! ShareSafely API Server
//!
//! Main entry point: upload files to Azure Blob Storage and hand out
//! time-limited read links.

use std::path::Path;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sharesafely_api::{AppState, create_router};
use sharesafely_core::identity::AmbientCredential;
use sharesafely_core::storage::{
    AzureBlobStore, ObjectStore, StorageAuth, StorageConfig, StorageError,
};
use sharesafely_shared::{AppConfig, AppError, AppResult, LogFormat};

fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "sharesafely=debug,tower_http=debug".into());
    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

async fn connect_store(config: &AppConfig) -> AppResult<Arc<dyn ObjectStore>> {
    config.validate()?;
    let account = config.storage.require_account_name()?;

    let http = reqwest::Client::builder()
        .user_agent(concat!("sharesafely/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| AppError::Initialization(format!("HTTP client: {e}")))?;

    let auth = match &config.storage.account_key {
        Some(key) => StorageAuth::shared_key(key.clone()),
        None => {
            info!("No account key configured, using ambient identity");
            StorageAuth::Identity(Arc::new(AmbientCredential::from_env()))
        }
    };

    let storage_config = StorageConfig::new(account, auth)
        .with_container(config.storage.container.clone())
        .with_endpoint(config.storage.endpoint.clone());

    let store = AzureBlobStore::initialize(&storage_config, http)
        .await
        .map_err(StorageError::into_startup_error)?;
    Ok(Arc::new(store))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(e) => {
            init_tracing(LogFormat::Pretty);
            error!(error = %e, "Failed to load configuration");
            std::process::exit(1);
        }
    };
    init_tracing(config.server.log_format);

    let store = match connect_store(&config).await {
        Ok(store) => store,
        Err(e) => {
            error!(code = e.error_code(), error = %e, "Startup failed");
            std::process::exit(1);
        }
    };

    let state = AppState::new(
        store,
        config.storage.sas_ttl_minutes,
        config.server.max_upload_bytes,
    );
    let app = create_router(state, Path::new(&config.server.static_dir));

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
