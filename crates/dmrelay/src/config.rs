use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tokio::fs;

use crate::commands::DEFAULT_PREFIX;

// ============================================================================
// Config (root)
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct Config {
    /// Where the relay target is persisted.
    #[serde(default = "default_store_path")]
    pub store_path: PathBuf,
    #[serde(default = "default_command_prefix")]
    pub command_prefix: String,
    /// Environment variable holding the bot token.
    #[serde(default = "default_token_env")]
    pub token_env: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store_path: default_store_path(),
            command_prefix: default_command_prefix(),
            token_env: default_token_env(),
        }
    }
}

impl Config {
    /// Default location of the config file.
    pub const DEFAULT_PATH: &'static str = "dmrelay.yaml";

    pub async fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = match fs::read_to_string(path).await {
            Ok(c) => c,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(ConfigError::Io(e)),
        };
        Ok(serde_saphyr::from_str(&contents)?)
    }

    /// Read the bot token from the configured environment variable.
    pub fn token(&self) -> Result<String, ConfigError> {
        self.token_from(|name| std::env::var(name).ok())
    }

    fn token_from(&self, lookup: impl Fn(&str) -> Option<String>) -> Result<String, ConfigError> {
        lookup(&self.token_env)
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ConfigError::MissingToken(self.token_env.clone()))
    }
}

fn default_store_path() -> PathBuf {
    PathBuf::from("relay_config.json")
}

fn default_command_prefix() -> String {
    DEFAULT_PREFIX.to_string()
}

fn default_token_env() -> String {
    "DISCORD_TOKEN".to_string()
}

// ============================================================================
// ConfigError
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Yaml(#[from] serde_saphyr::Error),

    #[error("{0} not found in environment or .env file")]
    MissingToken(String),
}

// ============================================================================
// Tests
// ============================================================================
