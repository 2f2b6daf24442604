use std::path::PathBuf;
use std::time::Duration;

use common::storage::filesystem::DEFAULT_CHUNK_SIZE;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

use crate::validation::MAX_UPLOAD_BYTES;

#[derive(Debug, Deserialize, Clone)]
pub struct CorsConfig {
    /// Allowed origins. Empty means any origin.
    pub allow_origins: Vec<String>,
    pub max_age: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors: CorsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    /// Shared secret for moderator tokens issued by the sign-in service.
    pub jwt_secret: String,
}

/// Blob store settings.
#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    /// Root directory of the chunked blob store. Default: "./data/blobs".
    #[serde(default = "default_blob_dir")]
    pub blob_dir: PathBuf,
    /// Chunk size in bytes. Default: 255 KiB.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    /// Upper bound for a single streaming write. Default: 30.
    #[serde(default = "default_write_timeout_secs")]
    pub write_timeout_secs: u64,
}

fn default_blob_dir() -> PathBuf {
    PathBuf::from("./data/blobs")
}
fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}
fn default_write_timeout_secs() -> u64 {
    30
}

impl StorageConfig {
    pub fn write_timeout(&self) -> Duration {
        Duration::from_secs(self.write_timeout_secs)
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            blob_dir: default_blob_dir(),
            chunk_size: default_chunk_size(),
            write_timeout_secs: default_write_timeout_secs(),
        }
    }
}

/// Upload size limit in bytes.
#[derive(Debug, Deserialize, Clone)]
pub struct UploadConfig {
    /// Slide/flyer uploads. Default: 5 MiB.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: u64,
}

fn default_max_bytes() -> u64 {
    MAX_UPLOAD_BYTES
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_bytes: default_max_bytes(),
        }
    }
}

/// Submissions feature flag settings.
#[derive(Debug, Deserialize, Clone)]
pub struct SubmissionsConfig {
    /// JSON file holding `{"submissionsEnabled": bool}`. Default: "./data/submissions.json".
    #[serde(default = "default_flag_path")]
    pub flag_path: PathBuf,
    /// How long a read of the flag file is trusted. Default: 5.
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
}

fn default_flag_path() -> PathBuf {
    PathBuf::from("./data/submissions.json")
}
fn default_cache_ttl_secs() -> u64 {
    5
}

impl SubmissionsConfig {
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

impl Default for SubmissionsConfig {
    fn default() -> Self {
        Self {
            flag_path: default_flag_path(),
            cache_ttl_secs: default_cache_ttl_secs(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub upload: UploadConfig,
    #[serde(default)]
    pub submissions: SubmissionsConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let s = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 5000)?
            .set_default("server.cors.allow_origins", Vec::<String>::new())?
            .set_default("server.cors.max_age", 3600)?
            .set_default("database.url", "sqlite://flyerbox.db?mode=rwc")?
            // Load from config/config.toml
            .add_source(File::with_name("config/config").required(false))
            // Override from environment (e.g., FLYERBOX__AUTH__JWT_SECRET)
            .add_source(Environment::with_prefix("FLYERBOX").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
