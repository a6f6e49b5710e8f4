//! Configuration module

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;
use zip::write::SimpleFileOptions;
use zip::CompressionMethod;

/// Default copy buffer used when extracting entries to disk (1 MiB)
pub const DEFAULT_CHUNK_SIZE: usize = 1024 * 1024;

/// Accepted deflate compression levels
const DEFLATE_LEVELS: std::ops::RangeInclusive<i64> = 0..=9;

/// Errors raised while loading a configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The configuration file could not be read
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The configuration text is not valid TOML for this schema
    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value is out of range
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Compression applied to file entries when packing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Compression {
    /// Deflate, the zip library's default
    #[default]
    Deflated,
    /// No compression
    Stored,
}

impl From<Compression> for CompressionMethod {
    fn from(compression: Compression) -> Self {
        match compression {
            Compression::Deflated => CompressionMethod::Deflated,
            Compression::Stored => CompressionMethod::Stored,
        }
    }
}

/// Settings shared by every archive operation
///
/// All fields have defaults, so an empty TOML document is a valid
/// configuration:
///
/// ```toml
/// chunk_size = 1048576
/// compression = "deflated"
/// compression_level = 6
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArchiverConfig {
    /// Buffer size in bytes for copying entries to disk
    pub chunk_size: usize,
    /// Compression method for file entries
    pub compression: Compression,
    /// Compression level handed to the zip library (None = library default)
    pub compression_level: Option<i64>,
}

impl Default for ArchiverConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            compression: Compression::default(),
            compression_level: None,
        }
    }
}

impl ArchiverConfig {
    /// Parse a configuration from TOML text
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Check value ranges
    ///
    /// Deflate levels run from 0 to 9. Packing validates its configuration
    /// before touching the filesystem; extraction only reads `chunk_size`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chunk_size == 0 {
            return Err(ConfigError::Invalid(
                "chunk_size must be greater than zero".to_string(),
            ));
        }
        if let (Compression::Stored, Some(level)) = (self.compression, self.compression_level) {
            return Err(ConfigError::Invalid(format!(
                "compression_level {} has no effect on stored entries",
                level
            )));
        }
        if let Some(level) = self.compression_level {
            if !DEFLATE_LEVELS.contains(&level) {
                return Err(ConfigError::Invalid(format!(
                    "compression_level {} is outside {}..={}",
                    level,
                    DEFLATE_LEVELS.start(),
                    DEFLATE_LEVELS.end()
                )));
            }
        }
        Ok(())
    }

    /// Options for file entries
    pub(crate) fn file_options(&self) -> SimpleFileOptions {
        SimpleFileOptions::default()
            .compression_method(self.compression.into())
            .compression_level(self.compression_level)
    }

    /// Options for directory entries
    pub(crate) fn directory_options(&self) -> SimpleFileOptions {
        SimpleFileOptions::default().compression_method(CompressionMethod::Stored)
    }
}
