//! Identifier configuration.
//!
//! Pins, diagnostics and the storage location are fixed when the manager
//! is constructed and never change afterwards.

use crate::hal::PinId;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default analog pin sampled for entropy.
pub const DEFAULT_SAMPLE_PIN: PinId = 0;
/// Default activity indicator pin.
pub const DEFAULT_INDICATOR_PIN: PinId = 2;
/// Default number of sample/mix rounds per generated byte.
pub const DEFAULT_ROUNDS_PER_BYTE: u32 = 256;
/// Default storage key for the persisted identifier.
pub const DEFAULT_STORAGE_PATH: &str = "/unique_id_128";

/// Configuration for the identity manager.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentityConfig {
    /// Analog pin sampled for entropy.
    pub sample_pin: PinId,
    /// Digital pin driving the activity indicator.
    pub indicator_pin: PinId,
    /// Emit diagnostic messages.
    pub diagnostics: bool,
    /// Sample/mix rounds consumed per generated byte.
    pub rounds_per_byte: u32,
    /// Storage key of the persisted identifier.
    pub storage_path: String,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            sample_pin: DEFAULT_SAMPLE_PIN,
            indicator_pin: DEFAULT_INDICATOR_PIN,
            diagnostics: true,
            rounds_per_byte: DEFAULT_ROUNDS_PER_BYTE,
            storage_path: DEFAULT_STORAGE_PATH.to_owned(),
        }
    }
}

impl IdentityConfig {
    /// Creates a configuration on the default pins.
    pub fn new(diagnostics: bool) -> Self {
        Self {
            diagnostics,
            ..Default::default()
        }
    }

    /// Sets the sample and indicator pins.
    pub fn with_pins(mut self, sample_pin: PinId, indicator_pin: PinId) -> Self {
        self.sample_pin = sample_pin;
        self.indicator_pin = indicator_pin;
        self
    }

    pub fn with_rounds_per_byte(mut self, rounds_per_byte: u32) -> Self {
        self.rounds_per_byte = rounds_per_byte;
        self
    }

    pub fn with_storage_path(mut self, path: impl Into<String>) -> Self {
        self.storage_path = path.into();
        self
    }

    /// Validates the configuration parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rounds_per_byte == 0 {
            return Err(ConfigError::InvalidRounds);
        }
        if self.storage_path.is_empty() {
            return Err(ConfigError::EmptyStoragePath);
        }
        Ok(())
    }
}

/// Configuration validation errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    #[error("rounds per byte must be at least 1")]
    InvalidRounds,
    #[error("storage path must not be empty")]
    EmptyStoragePath,
    #[error("failed to read config file: {0}")]
    FileReadError(String),
    #[error("failed to parse config file: {0}")]
    ParseError(String),
}

/// Full configuration file format.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FileConfig {
    #[serde(default)]
    pub identity: IdentityConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

/// Host filesystem backend settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory that stands in for the device filesystem.
    pub root: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("device-storage"),
        }
    }
}

impl FileConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::FileReadError(e.to_string()))?;
        Self::from_toml(&content)
    }

    /// Parses configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: FileConfig =
            toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.identity.validate()?;
        Ok(config)
    }
}
