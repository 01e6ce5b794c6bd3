//! Pipe and codec configuration.
//!
//! Configuration is loaded in the following order (later overrides earlier):
//! 1. Default values
//! 2. YAML config file (if specified via BUILDSRV_CONFIG)
//! 3. Environment variables

use buildsrv_protocol::{CodecLimits, TAG_SIZE};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default read buffer size (8 KiB).
pub const DEFAULT_READ_BUFFER_SIZE: usize = 8 * 1024;

/// Minimum read buffer size (1 KiB).
pub const MIN_READ_BUFFER_SIZE: usize = 1024;

/// Maximum read buffer size (1 MiB).
pub const MAX_READ_BUFFER_SIZE: usize = 1024 * 1024;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Codec size limits.
    pub codec: CodecLimits,
    /// Stream I/O settings.
    pub pipe: PipeConfig,
}

impl Config {
    /// Loads configuration from file, then applies environment variable overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Ok(path) = std::env::var("BUILDSRV_CONFIG") {
            config = Self::from_file(&path)?;
        }

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::IoError(path.to_path_buf(), e))?;
        let mut config: Config = serde_yaml::from_str(&content)
            .map_err(|e| ConfigError::ParseError(path.to_path_buf(), e.to_string()))?;
        config.pipe.read_buffer_size = clamp_read_buffer_size(config.pipe.read_buffer_size);
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(max) = std::env::var("BUILDSRV_MAX_MESSAGE_SIZE") {
            if let Ok(n) = max.parse() {
                self.codec.max_message_size = n;
            }
        }

        self.pipe.apply_env_overrides();
    }

    /// Validates limits that would make every exchange fail.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if (self.codec.max_message_size as usize) < TAG_SIZE {
            return Err(ConfigError::ValidationError(format!(
                "codec.max_message_size must be at least {} bytes",
                TAG_SIZE
            )));
        }
        if !(MIN_READ_BUFFER_SIZE..=MAX_READ_BUFFER_SIZE).contains(&self.pipe.read_buffer_size) {
            return Err(ConfigError::ValidationError(format!(
                "pipe.read_buffer_size must be between {} and {} bytes",
                MIN_READ_BUFFER_SIZE, MAX_READ_BUFFER_SIZE
            )));
        }
        Ok(())
    }
}

/// Stream I/O configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipeConfig {
    /// How long to wait for a complete response, in milliseconds.
    pub read_timeout_ms: u64,
    /// How long to wait for a response to be written, in milliseconds.
    pub write_timeout_ms: u64,
    /// Read buffer size for stream reads.
    pub read_buffer_size: usize,
}

impl Default for PipeConfig {
    fn default() -> Self {
        Self {
            // A response arrives only after the compilation finishes.
            read_timeout_ms: 600_000,
            write_timeout_ms: 30_000,
            read_buffer_size: DEFAULT_READ_BUFFER_SIZE,
        }
    }
}

impl PipeConfig {
    fn apply_env_overrides(&mut self) {
        if let Ok(timeout) = std::env::var("BUILDSRV_READ_TIMEOUT_MS") {
            if let Ok(ms) = timeout.parse() {
                self.read_timeout_ms = ms;
            }
        }

        if let Ok(timeout) = std::env::var("BUILDSRV_WRITE_TIMEOUT_MS") {
            if let Ok(ms) = timeout.parse() {
                self.write_timeout_ms = ms;
            }
        }

        if let Ok(size) = std::env::var("BUILDSRV_READ_BUFFER_SIZE") {
            if let Ok(n) = size.parse() {
                self.read_buffer_size = clamp_read_buffer_size(n);
            }
        }
    }

    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout_ms = duration_to_ms(timeout);
        self
    }

    pub fn with_write_timeout(mut self, timeout: Duration) -> Self {
        self.write_timeout_ms = duration_to_ms(timeout);
        self
    }

    pub fn with_read_buffer_size(mut self, size: usize) -> Self {
        self.read_buffer_size = clamp_read_buffer_size(size);
        self
    }

    /// Returns read timeout as Duration.
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    /// Returns write timeout as Duration.
    pub fn write_timeout(&self) -> Duration {
        Duration::from_millis(self.write_timeout_ms)
    }
}

fn clamp_read_buffer_size(size: usize) -> usize {
    size.clamp(MIN_READ_BUFFER_SIZE, MAX_READ_BUFFER_SIZE)
}

fn duration_to_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Configuration error.
#[derive(Debug)]
pub enum ConfigError {
    IoError(PathBuf, std::io::Error),
    ParseError(PathBuf, String),
    ValidationError(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError(path, e) => {
                write!(f, "failed to read config file '{}': {}", path.display(), e)
            }
            ConfigError::ParseError(path, e) => {
                write!(f, "failed to parse config file '{}': {}", path.display(), e)
            }
            ConfigError::ValidationError(msg) => {
                write!(f, "configuration validation failed: {}", msg)
            }
        }
    }
}

impl std::error::Error for ConfigError {}
