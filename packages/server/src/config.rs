use std::path::PathBuf;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct CorsConfig {
    /// Allowed origins. Empty allows any origin.
    #[serde(default)]
    pub allow_origins: Vec<String>,
    pub max_age: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RateLimitConfig {
    pub window_secs: u64,
    pub max_requests: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            window_secs: 15 * 60,
            max_requests: 100,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors: CorsConfig,
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Filesystem,
    S3,
}

#[derive(Debug, Deserialize, Clone)]
pub struct S3Config {
    pub endpoint: String,
    pub region: String,
    pub access_key: String,
    pub secret_key: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// Root directory for the filesystem backend.
    pub path: PathBuf,
    pub bucket: String,
    /// Maximum accepted image size in bytes.
    pub max_image_size: u64,
    pub s3: Option<S3Config>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct MailConfig {
    /// Provider API key. Required to send mail.
    pub api_key: Option<String>,
    /// Verified sender address. Required to send mail.
    pub sender: Option<String>,
    /// Inbox receiving contact-form mail. Defaults to the sender.
    pub recipient: Option<String>,
    pub endpoint: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub storage: StorageConfig,
    pub mail: MailConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let s = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 5000)?
            .set_default("server.cors.max_age", 3600)?
            .set_default("server.rate_limit.window_secs", 900)?
            .set_default("server.rate_limit.max_requests", 100)?
            .set_default("database.max_connections", 20)?
            .set_default("storage.backend", "filesystem")?
            .set_default("storage.path", "./storage")?
            .set_default("storage.bucket", "portfolio-images")?
            .set_default("storage.max_image_size", common::image::MAX_IMAGE_BYTES)?
            .set_default("mail.endpoint", "https://api.resend.com/emails")?
            // Load from config/config.toml
            .add_source(File::with_name("config/config").required(false))
            // Override from environment (e.g., PORTFOLIO__DATABASE__URL)
            .add_source(
                Environment::with_prefix("PORTFOLIO")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("server.cors.allow_origins")
                    .try_parsing(true),
            )
            .build()?;

        s.try_deserialize()
    }
}
