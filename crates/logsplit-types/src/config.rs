//! Filter configuration loading
//!
//! Filter sets are read from TOML or JSON files:
//!
//! ```toml
//! [[channels]]
//! name = "errors"
//! combinator = "any"
//! filters = [
//!     { keyword = "ERROR" },
//!     { keyword = 'code=\d+', reg = true },
//! ]
//! ```
//!
//! JSON files use the same shape (`{"channels": [...]}`) or a bare array of
//! filter sets.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::FilterSetConfig;

/// Files looked up in the working directory when no config path is given
pub const DEFAULT_CONFIG_FILES: &[&str] = &["filters.toml", "filters.json"];

/// Result type for configuration operations
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Errors that can occur when loading filter configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file
    #[error("failed to read config file '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Failed to parse TOML
    #[error("failed to parse TOML config: {0}")]
    Toml(#[from] toml::de::Error),

    /// Failed to parse JSON
    #[error("failed to parse JSON config: {0}")]
    Json(#[from] serde_json::Error),

    /// File extension is neither .toml nor .json
    #[error("unsupported config format '{}' (expected .toml or .json)", .path.display())]
    UnsupportedFormat { path: PathBuf },

    /// No config path given and none of the default files exist
    #[error("no filter config found (looked for {searched})")]
    NotFound { searched: String },
}

impl ConfigError {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn not_found(dir: &Path) -> Self {
        let searched = DEFAULT_CONFIG_FILES
            .iter()
            .map(|name| dir.join(name).display().to_string())
            .collect::<Vec<_>>()
            .join(", ");
        Self::NotFound { searched }
    }
}

/// Ordered list of filter sets
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterConfig {
    #[serde(default)]
    pub channels: Vec<FilterSetConfig>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum JsonShape {
    Table(FilterConfig),
    List(Vec<FilterSetConfig>),
}

impl FilterConfig {
    pub fn new(channels: Vec<FilterSetConfig>) -> Self {
        Self { channels }
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        let shape: JsonShape = serde_json::from_str(content)?;
        Ok(match shape {
            JsonShape::Table(config) => config,
            JsonShape::List(channels) => Self::new(channels),
        })
    }

    /// Load a config file, picking the parser from the file extension
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::io(path, e))?;

        let config = match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Self::from_toml_str(&content)?,
            Some("json") => Self::from_json_str(&content)?,
            _ => {
                return Err(ConfigError::UnsupportedFormat {
                    path: path.to_path_buf(),
                });
            }
        };

        tracing::debug!(
            path = %path.display(),
            channels = config.channels.len(),
            "loaded filter config"
        );
        Ok(config)
    }

    /// Find the first default config file present in `dir`
    pub fn discover(dir: &Path) -> Result<PathBuf> {
        DEFAULT_CONFIG_FILES
            .iter()
            .map(|name| dir.join(name))
            .find(|path| path.is_file())
            .ok_or_else(|| ConfigError::not_found(dir))
    }

    /// Channel names in configuration order
    pub fn names(&self) -> Vec<&str> {
        self.channels.iter().map(|c| c.name.as_str()).collect()
    }
}
