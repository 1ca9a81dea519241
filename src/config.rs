use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::services::Session;

pub const DEFAULT_BUCKET: &str = "cvs";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Deserialize, Default)]
pub struct AppConfig {
    pub backend: Option<BackendConfig>,
    pub session: Option<SessionConfig>,
    #[serde(default)]
    pub storage: StorageConfig,
}

#[derive(Debug, Deserialize)]
pub struct BackendConfig {
    pub url: String,
    pub anon_key: String,
    /// Per-request limit; a request still pending after this fails.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize)]
pub struct SessionConfig {
    pub user_id: String,
    pub access_token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_bucket")]
    pub bucket: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            bucket: default_bucket(),
        }
    }
}

fn default_bucket() -> String {
    DEFAULT_BUCKET.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl AppConfig {
    pub fn backend(&self) -> Result<&BackendConfig> {
        match &self.backend {
            Some(b) => Ok(b),
            None => bail!(
                "No backend configured. Add a [backend] section to {}",
                config_path().display()
            ),
        }
    }

    pub fn session(&self) -> Result<Session> {
        match &self.session {
            Some(s) if !s.user_id.trim().is_empty() => {
                Ok(Session::new(s.user_id.trim(), s.access_token.clone()))
            }
            _ => bail!(
                "No session configured. Add a [session] section with user_id to {}",
                config_path().display()
            ),
        }
    }
}

pub fn data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".equitydesk")
}

fn config_path() -> PathBuf {
    std::env::var_os("EQUITYDESK_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|| data_dir().join("config.toml"))
}

pub fn load_config() -> Result<AppConfig> {
    load_config_from(&config_path())
}

pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    if !path.exists() {
        return Ok(AppConfig::default());
    }
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config from {}", path.display()))?;
    let config: AppConfig = toml::from_str(&contents)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    Ok(config)
}
