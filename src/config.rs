//! Server configuration.
//!
//! Defaults can be overridden by an optional TOML file, then by CLI flags and
//! `PDFREDACT_*` environment variables (applied in `main`).

use crate::domain::{StorageLayout, DEFAULT_PLACEHOLDER};
use crate::redaction::mupdf::DEFAULT_MAX_HITS;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config file '{path}': {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub uploads_dir: PathBuf,
    pub outputs_dir: PathBuf,
    pub placeholder_label: String,
    /// RGB fill drawn over redacted regions, components in 0..=1
    pub fill_color: [f32; 3],
    /// Search hit cap per keyword per page
    pub max_hits: u32,
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            uploads_dir: PathBuf::from("uploads"),
            outputs_dir: PathBuf::from("outputs"),
            placeholder_label: DEFAULT_PLACEHOLDER.to_string(),
            fill_color: [1.0, 1.0, 0.0],
            max_hits: DEFAULT_MAX_HITS,
            max_upload_bytes: 50 * 1024 * 1024,
        }
    }
}

impl ServerConfig {
    /// Loads a config file, or the defaults when `path` is `None`.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self
            .fill_color
            .iter()
            .any(|c| !(0.0..=1.0).contains(c))
        {
            return Err(ConfigError::Invalid(format!(
                "fill_color components must be within 0..=1, got {:?}",
                self.fill_color
            )));
        }
        if self.max_hits == 0 {
            return Err(ConfigError::Invalid("max_hits must be positive".to_string()));
        }
        if self.max_upload_bytes == 0 {
            return Err(ConfigError::Invalid(
                "max_upload_bytes must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn layout(&self) -> StorageLayout {
        StorageLayout::new(&self.uploads_dir, &self.outputs_dir)
    }
}
