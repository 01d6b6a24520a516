//! Configuration management for Code Sprint
//!
//! Configuration is read from `$SPRINT_CONFIG` or
//! `<config_dir>/codesprint/config.toml`. A missing file is not an error;
//! defaults are used and environment variables can override single fields.
//!
//! ```toml
//! [backend]
//! base_url = "http://localhost:8000"
//! api_key = "workshop-key"
//!
//! [storage]
//! path = "~/.local/share/codesprint/session.json"
//! scope_code_per_team = false
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{ConfigError, Result};

pub const CONFIG_ENV: &str = "SPRINT_CONFIG";
pub const API_URL_ENV: &str = "SPRINT_API_URL";
pub const API_KEY_ENV: &str = "SPRINT_API_KEY";
pub const STORE_ENV: &str = "SPRINT_STORE";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    pub base_url: String,
    #[serde(default)]
    pub api_key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub path: String,
    /// Keep one code buffer per team instead of one per device
    #[serde(default)]
    pub scope_code_per_team: bool,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            api_key: String::new(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: "~/.local/share/codesprint/session.json".to_string(),
            scope_code_per_team: false,
        }
    }
}

impl Config {
    /// Load configuration from the default location, then apply environment overrides
    pub fn load() -> Result<Self> {
        let config_path = resolve_config_path()?;
        let config = if config_path.exists() {
            Self::load_from_path(&config_path)?
        } else {
            tracing::debug!("No config file at {}, using defaults", config_path.display());
            Self::default()
        };
        Ok(config.with_env_overrides())
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadError)?;
        let config: Config = toml::from_str(&content).map_err(ConfigError::ParseError)?;
        Ok(config)
    }

    /// Apply `SPRINT_API_URL`, `SPRINT_API_KEY` and `SPRINT_STORE`
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(url) = std::env::var(API_URL_ENV) {
            self.backend.base_url = url;
        }
        if let Ok(key) = std::env::var(API_KEY_ENV) {
            self.backend.api_key = key;
        }
        if let Ok(path) = std::env::var(STORE_ENV) {
            self.storage.path = path;
        }
        self
    }

    /// Store path with `~` expanded
    pub fn store_path(&self) -> PathBuf {
        expand_path(&self.storage.path)
    }

    /// Backend base URL without a trailing slash
    pub fn base_url(&self) -> Result<String> {
        let url = self.backend.base_url.trim().trim_end_matches('/');
        if url.is_empty() {
            return Err(ConfigError::MissingField("backend.base_url".to_string()).into());
        }
        Ok(url.to_string())
    }
}

/// Resolve the configuration file path following XDG Base Directory spec
pub fn resolve_config_path() -> Result<PathBuf> {
    if let Ok(path) = std::env::var(CONFIG_ENV) {
        return Ok(expand_path(&path));
    }

    let config_dir = dirs::config_dir()
        .ok_or_else(|| ConfigError::MissingField("config directory".to_string()))?;

    Ok(config_dir.join("codesprint").join("config.toml"))
}

/// Resolve the data directory path following XDG Base Directory spec
pub fn resolve_data_path() -> Result<PathBuf> {
    let data_dir = dirs::data_dir()
        .ok_or_else(|| ConfigError::MissingField("data directory".to_string()))?;

    Ok(data_dir.join("codesprint"))
}

fn expand_path(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).to_string())
}
