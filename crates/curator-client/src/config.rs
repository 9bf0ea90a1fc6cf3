//! Configuration types and loading
//!
//! Config precedence: CLI arg > env vars > config file > defaults.
//! `CURATOR_BASE_URL` overrides the file's base URL so the same config can
//! point a shell at staging or a local backend without editing it.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Error, Result};

/// Root configuration.
#[derive(Debug, Deserialize)]
pub struct Config {
    pub api: ApiConfig,
    pub session: SessionConfig,
}

/// Backend connection settings.
#[derive(Debug, Deserialize)]
pub struct ApiConfig {
    pub base_url: String,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

/// Persisted session settings.
#[derive(Debug, Deserialize)]
pub struct SessionConfig {
    /// Path of the persisted session file.
    pub file: PathBuf,
    /// Credential prefix marking non-refreshable development sessions.
    #[serde(default = "default_mock_marker")]
    pub mock_marker: String,
}

fn default_timeout() -> u64 {
    60
}

fn default_mock_marker() -> String {
    curator_session::DEV_MOCK_PREFIX.into()
}

impl Config {
    /// Load configuration from a TOML file, then overlay environment
    /// variables.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("reading {}: {e}", path.display())))?;
        let mut config: Config = toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("parsing {}: {e}", path.display())))?;

        if let Ok(url) = std::env::var("CURATOR_BASE_URL") {
            config.api.base_url = url;
        }

        if !config.api.base_url.starts_with("http://")
            && !config.api.base_url.starts_with("https://")
        {
            return Err(Error::Config(format!(
                "base_url must start with http:// or https://, got: {}",
                config.api.base_url
            )));
        }

        if config.api.timeout_secs == 0 {
            return Err(Error::Config("timeout_secs must be greater than 0".into()));
        }

        if config.session.mock_marker.is_empty() {
            return Err(Error::Config("mock_marker must not be empty".into()));
        }

        Ok(config)
    }

    /// Resolve the config file path from a CLI arg or the CONFIG_PATH env
    /// var.
    pub fn resolve_path(cli_path: Option<&str>) -> PathBuf {
        if let Some(p) = cli_path {
            return PathBuf::from(p);
        }
        if let Ok(p) = std::env::var("CONFIG_PATH") {
            return PathBuf::from(p);
        }
        PathBuf::from("curator.toml")
    }
}
