use std::sync::Arc;

use axum::extract::FromRef;
use common::storage::BlobStore;
use sea_orm::DatabaseConnection;

use crate::config::AppConfig;
use crate::extractors::payload::ImageLimit;
use crate::rate_limit::RateLimiter;
use crate::utils::mail::Mailer;

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub blob_store: Arc<dyn BlobStore>,
    pub config: AppConfig,
    pub mailer: Mailer,
    pub rate_limiter: Arc<RateLimiter>,
}

impl AppState {
    pub fn new(db: DatabaseConnection, blob_store: Arc<dyn BlobStore>, config: AppConfig) -> Self {
        Self {
            mailer: Mailer::new(config.mail.clone()),
            rate_limiter: Arc::new(RateLimiter::new(&config.server.rate_limit)),
            db,
            blob_store,
            config,
        }
    }
}

impl FromRef<AppState> for ImageLimit {
    fn from_ref(state: &AppState) -> Self {
        ImageLimit(state.config.storage.max_image_size)
    }
}
