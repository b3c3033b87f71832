//! Configuration loading and path resolution.
//!
//! Configuration lives in `<home>/config.toml` and is optional: when the file
//! is absent every field falls back to its default. Base URL resolution adds
//! an environment override on top (see [`resolve_base_url`]).

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Default backend base URL (local development server).
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Backend base URL (overridden by `DRIVECHAT_BASE_URL`).
    pub base_url: String,

    /// Milliseconds after which the progress stage advances to Reading.
    pub stage_read_after_ms: u64,

    /// Milliseconds after which the progress stage advances to Thinking.
    pub stage_think_after_ms: u64,
}

impl Config {
    const DEFAULT_STAGE_READ_AFTER_MS: u64 = 1500;
    const DEFAULT_STAGE_THINK_AFTER_MS: u64 = 4000;

    /// Loads configuration from the default config path.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load() -> Result<Self> {
        Self::load_from(&paths::config_path())
    }

    /// Loads configuration from a specific path.
    /// Returns defaults if the file doesn't exist.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config from {}", path.display()))?;
            toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config from {}", path.display()))
        } else {
            Ok(Config::default())
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            stage_read_after_ms: Self::DEFAULT_STAGE_READ_AFTER_MS,
            stage_think_after_ms: Self::DEFAULT_STAGE_THINK_AFTER_MS,
        }
    }
}

/// Resolves the backend base URL with precedence: env > config > default.
///
/// # Errors
/// Returns an error if the resolved value is not a well-formed URL.
pub fn resolve_base_url(config: &Config) -> Result<String> {
    if let Ok(env_url) = std::env::var("DRIVECHAT_BASE_URL") {
        let trimmed = env_url.trim();
        if !trimmed.is_empty() {
            validate_url(trimmed)?;
            return Ok(trimmed.trim_end_matches('/').to_string());
        }
    }

    let trimmed = config.base_url.trim();
    if !trimmed.is_empty() {
        validate_url(trimmed)?;
        return Ok(trimmed.trim_end_matches('/').to_string());
    }

    Ok(DEFAULT_BASE_URL.to_string())
}

fn validate_url(url: &str) -> Result<()> {
    url::Url::parse(url).with_context(|| format!("Invalid backend base URL: {url}"))?;
    Ok(())
}

pub mod paths {
    //! Path resolution for drivechat configuration and data files.
    //!
    //! `DRIVECHAT_HOME` resolution order:
    //! 1. `DRIVECHAT_HOME` environment variable (if set)
    //! 2. `~/.config/drivechat` (default)

    use std::path::PathBuf;

    /// Returns the drivechat home directory.
    ///
    /// Checks `DRIVECHAT_HOME` env var first, falls back to `~/.config/drivechat`.
    pub fn drivechat_home() -> PathBuf {
        if let Ok(home) = std::env::var("DRIVECHAT_HOME") {
            return PathBuf::from(home);
        }

        dirs::home_dir()
            .map(|h| h.join(".config").join("drivechat"))
            .expect("Could not determine home directory")
    }

    /// Returns the path to the config.toml file.
    pub fn config_path() -> PathBuf {
        drivechat_home().join("config.toml")
    }

    /// Returns the path to the persisted session snapshot.
    pub fn session_path() -> PathBuf {
        drivechat_home().join("session.json")
    }
}
