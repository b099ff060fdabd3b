//! File-based configuration
//!
//! An [`EtlConfig`] bundles the settings a pipeline passes to its data
//! sources. Every table is optional and falls back to its defaults:
//!
//! ```toml
//! [source]
//! chunk_size = 5000
//! workers = 4
//!
//! [file]
//! delimiter = ";"
//! has_header = true
//!
//! [connection]
//! host = "vertica.internal"
//! port = 5433
//! database = "warehouse"
//! ```
//!
//! Credentials are never read from this file; resolve them with a
//! [`CredentialProvider`](crate::connection::CredentialProvider).

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::connection::ConnectionParams;
use crate::source::{FileOptions, SourceConfig};

/// Errors raised while loading configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

impl ConfigError {
    /// Get a user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            ConfigError::Io { path, .. } => format!(
                "{self}\n\nHint: Check that {} exists and is readable.",
                path.display()
            ),
            ConfigError::Parse(_) => {
                format!("{self}\n\nHint: Valid tables are [source], [file] and [connection].")
            }
            ConfigError::Invalid(_) => self.to_string(),
        }
    }
}

/// Settings for data sources and their connection
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EtlConfig {
    pub source: SourceConfig,
    pub file: FileOptions,
    pub connection: ConnectionParams,
}

impl EtlConfig {
    /// Parse and validate TOML text
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: EtlConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&text)?;
        debug!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Render as TOML
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Invalid(e.to_string()))
    }

    fn validate(&self) -> Result<(), ConfigError> {
        self.source.validate().map_err(ConfigError::Invalid)?;
        self.file.delimiter_byte().map_err(ConfigError::Invalid)?;
        if self.connection.host.trim().is_empty() {
            return Err(ConfigError::Invalid("connection host is empty".to_string()));
        }
        Ok(())
    }
}
