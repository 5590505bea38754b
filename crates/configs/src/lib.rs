//! # configs
//!
//! Layered settings for the symbol service. Later layers win:
//!
//! 1. built-in defaults
//! 2. `{dir}/default.toml` (optional)
//! 3. `{dir}/local.toml` (optional, not checked in)
//! 4. `SYMBOLS__SECTION__KEY` environment variables (`.env` is loaded first)

use std::path::{Path, PathBuf};

use secrecy::SecretString;
use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub storage: StorageSettings,
    pub log: LogSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize)]
pub struct DatabaseSettings {
    pub url: SecretString,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageSettings {
    /// Base directory for uploads; thumbnails go to `{upload_dir}/{thumbs_folder}`.
    pub upload_dir: PathBuf,
    /// Public URL prefix under which `upload_dir` is served.
    pub upload_base_url: String,
    pub thumbs_folder: String,
    /// Image shown for symbols without a generated thumbnail.
    pub placeholder_url: String,
    pub thumbnail_max_edge: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogSettings {
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    pub filter: String,
    pub json: bool,
}

impl Settings {
    /// Loads settings with config files looked up in `./config`.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::load_from(Path::new("config"))
    }

    pub fn load_from(dir: &Path) -> Result<Self, ConfigError> {
        let settings = config::Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default("database.url", "sqlite:symbols.db")?
            .set_default("database.max_connections", 5)?
            .set_default("storage.upload_dir", "./data/uploads")?
            .set_default("storage.upload_base_url", "/uploads")?
            .set_default("storage.thumbs_folder", "symbols")?
            .set_default("storage.placeholder_url", "/assets/no-template-preview.jpg")?
            .set_default("storage.thumbnail_max_edge", 800)?
            .set_default("log.filter", "info")?
            .set_default("log.json", false)?
            .add_source(config::File::from(dir.join("default.toml")).required(false))
            .add_source(config::File::from(dir.join("local.toml")).required(false))
            .add_source(
                config::Environment::with_prefix("SYMBOLS")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?
            .try_deserialize::<Settings>()?;

        settings.validate()?;
        tracing::debug!(host = %settings.server.host, port = settings.server.port, "settings loaded");
        Ok(settings)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.storage.thumbs_folder.is_empty() || self.storage.thumbs_folder.contains(['/', '\\']) {
            return Err(ConfigError::Invalid(format!(
                "storage.thumbs_folder must be a single path segment, got '{}'",
                self.storage.thumbs_folder
            )));
        }
        if self.storage.thumbnail_max_edge == 0 {
            return Err(ConfigError::Invalid("storage.thumbnail_max_edge must be positive".into()));
        }
        Ok(())
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
