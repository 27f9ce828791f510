//! Configuration loading: TOML file with environment overrides.
//!
//! Priority order per setting: environment variable, then TOML config file,
//! then compiled default. Catalog credentials have no default; the service
//! refuses to start without them.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

/// Default listen address
pub const DEFAULT_BIND: &str = "127.0.0.1:5760";

/// Default SQLite database path
pub const DEFAULT_DB_PATH: &str = "tunenote.db";

/// Service configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Address the HTTP server binds to
    #[serde(default = "default_bind")]
    pub bind_address: String,
    /// SQLite database file path
    #[serde(default = "default_db_path")]
    pub database_path: PathBuf,
    /// Catalog provider settings
    pub catalog: CatalogConfig,
}

/// Catalog provider (Spotify-shaped API) settings
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogConfig {
    pub client_id: String,
    pub client_secret: String,
    /// Web API base URL
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// Token endpoint URL (client-credentials grant)
    #[serde(default = "default_token_url")]
    pub token_url: String,
}

fn default_bind() -> String {
    DEFAULT_BIND.to_string()
}

fn default_db_path() -> PathBuf {
    PathBuf::from(DEFAULT_DB_PATH)
}

fn default_api_url() -> String {
    "https://api.spotify.com/v1".to_string()
}

fn default_token_url() -> String {
    "https://accounts.spotify.com/api/token".to_string()
}

impl Config {
    /// Load configuration from a TOML file, then apply environment overrides.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let mut config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        config.apply_env_overrides();
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Build configuration purely from environment variables.
    ///
    /// Used when no config file exists; credentials must come from
    /// `TUNENOTE_CATALOG_CLIENT_ID` / `TUNENOTE_CATALOG_CLIENT_SECRET`.
    pub fn from_env() -> Result<Self> {
        let client_id = std::env::var("TUNENOTE_CATALOG_CLIENT_ID")
            .context("TUNENOTE_CATALOG_CLIENT_ID not set and no config file found")?;
        let client_secret = std::env::var("TUNENOTE_CATALOG_CLIENT_SECRET")
            .context("TUNENOTE_CATALOG_CLIENT_SECRET not set and no config file found")?;

        let mut config = Config {
            bind_address: default_bind(),
            database_path: default_db_path(),
            catalog: CatalogConfig {
                client_id,
                client_secret,
                api_url: default_api_url(),
                token_url: default_token_url(),
            },
        };
        config.apply_env_overrides();
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(bind) = std::env::var("TUNENOTE_BIND") {
            self.bind_address = bind;
        }
        if let Ok(db) = std::env::var("TUNENOTE_DATABASE") {
            self.database_path = PathBuf::from(db);
        }
        if let Ok(id) = std::env::var("TUNENOTE_CATALOG_CLIENT_ID") {
            self.catalog.client_id = id;
        }
        if let Ok(secret) = std::env::var("TUNENOTE_CATALOG_CLIENT_SECRET") {
            self.catalog.client_secret = secret;
        }
        if let Ok(url) = std::env::var("TUNENOTE_CATALOG_API_URL") {
            self.catalog.api_url = url;
        }
        if let Ok(url) = std::env::var("TUNENOTE_CATALOG_TOKEN_URL") {
            self.catalog.token_url = url;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_config() {
        let toml = r#"
            [catalog]
            client_id = "id"
            client_secret = "secret"
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.bind_address, DEFAULT_BIND);
        assert_eq!(config.database_path, PathBuf::from(DEFAULT_DB_PATH));
        assert_eq!(config.catalog.api_url, "https://api.spotify.com/v1");
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
            bind_address = "0.0.0.0:8080"
            database_path = "/var/lib/tunenote/tunenote.db"

            [catalog]
            client_id = "id"
            client_secret = "secret"
            api_url = "http://localhost:9090/v1"
            token_url = "http://localhost:9090/token"
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.bind_address, "0.0.0.0:8080");
        assert_eq!(config.catalog.api_url, "http://localhost:9090/v1");
    }
}
