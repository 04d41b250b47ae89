use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use common::storage::BlobStore;
use common::storage::filesystem::FilesystemBlobStore;
use common::storage::s3::{S3BlobStore, S3Settings};
use tracing::info;
use tracing_subscriber::EnvFilter;

use portfolio_server::config::{AppConfig, StorageBackend, StorageConfig};
use portfolio_server::state::AppState;
use portfolio_server::{build_router, database, seed};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::load().context("Failed to load configuration")?;

    let db = database::init_db(&config.database)
        .await
        .context("Failed to connect to the database")?;
    seed::ensure_indexes(&db).await?;
    seed::seed_portfolios(&db).await?;

    let blob_store = build_blob_store(&config.storage).await?;
    info!(
        backend = ?config.storage.backend,
        bucket = blob_store.bucket(),
        "Blob store ready"
    );

    if config.mail.api_key.is_none() || config.mail.sender.is_none() {
        tracing::warn!("Mail credentials are not configured; /send-email will fail");
    }

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server.host or server.port")?;

    let state = AppState::new(db, blob_store, config);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Server running at http://{}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("Server stopped");
    Ok(())
}

async fn build_blob_store(config: &StorageConfig) -> anyhow::Result<Arc<dyn BlobStore>> {
    let store: Arc<dyn BlobStore> = match config.backend {
        StorageBackend::Filesystem => Arc::new(
            FilesystemBlobStore::new(config.path.clone(), &config.bucket, config.max_image_size)
                .await
                .context("Failed to prepare the storage directory")?,
        ),
        StorageBackend::S3 => {
            let s3 = config
                .s3
                .as_ref()
                .context("storage.s3 must be set when storage.backend = \"s3\"")?;
            let settings = S3Settings {
                endpoint: s3.endpoint.clone(),
                region: s3.region.clone(),
                access_key: s3.access_key.clone(),
                secret_key: s3.secret_key.clone(),
            };
            Arc::new(S3BlobStore::new(
                &settings,
                &config.bucket,
                config.max_image_size,
            )?)
        }
    };
    Ok(store)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Received Ctrl+C, shutting down");
}
