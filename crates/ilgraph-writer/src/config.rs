//! Export configuration, loaded from TOML
//!
//! ```toml
//! format = "binary"          # binary | xml | none
//! output_dir = "graphs"
//! file_prefix = "IlCompilation"
//! flush_threshold = 4096
//! ```

use crate::encoder::DEFAULT_FLUSH_THRESHOLD;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

pub const DEFAULT_FILE_PREFIX: &str = "IlCompilation";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("unknown export format '{0}' (expected binary, xml or none)")]
    UnknownFormat(String),

    #[error("flush_threshold must be greater than zero")]
    ZeroFlushThreshold,

    #[error("file_prefix must not be empty")]
    EmptyPrefix,
}

/// Which exporter a compilation gets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Binary,
    Xml,
    None,
}

impl ExportFormat {
    pub fn name(self) -> &'static str {
        match self {
            ExportFormat::Binary => "binary",
            ExportFormat::Xml => "xml",
            ExportFormat::None => "none",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ExportFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "binary" | "bgv" => Ok(ExportFormat::Binary),
            "xml" => Ok(ExportFormat::Xml),
            "none" | "off" => Ok(ExportFormat::None),
            _ => Err(ConfigError::UnknownFormat(s.to_string())),
        }
    }
}

/// Exporter settings. Every field has a default, so an empty file is valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExportConfig {
    pub format: ExportFormat,
    /// Directory destinations are created in.
    pub output_dir: PathBuf,
    pub file_prefix: String,
    /// Buffered bytes that trigger a flush to the destination.
    pub flush_threshold: usize,
}

impl Default for ExportConfig {
    fn default() -> Self {
        ExportConfig {
            format: ExportFormat::default(),
            output_dir: PathBuf::from("."),
            file_prefix: DEFAULT_FILE_PREFIX.to_string(),
            flush_threshold: DEFAULT_FLUSH_THRESHOLD,
        }
    }
}

impl ExportConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: ExportConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::from_toml_str(&text)?;
        tracing::debug!("Loaded export config from {}: {:?}", path.display(), config);
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.flush_threshold == 0 {
            return Err(ConfigError::ZeroFlushThreshold);
        }
        if self.file_prefix.is_empty() {
            return Err(ConfigError::EmptyPrefix);
        }
        Ok(())
    }
}
