//! Logger configuration: TOML defaults layered under command-line flags.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::{AppError, Result};

/// Transfer buffer capacity used by every relay channel.
pub const DEFAULT_BUFFER_SIZE: usize = 4096;

/// Name prefix used when neither the config file nor the CLI sets one.
pub const DEFAULT_NAME_PREFIX: &str = "log";

fn default_name_prefix() -> String {
    DEFAULT_NAME_PREFIX.into()
}

fn default_log_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_buffer_size() -> usize {
    DEFAULT_BUFFER_SIZE
}

/// Effective settings for one wrapper run.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub struct LoggerConfig {
    /// Prefix shared by the four session log files.
    #[serde(default = "default_name_prefix")]
    pub name_prefix: String,
    /// Directory the session log files are created in.
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,
    /// Capacity in bytes of each channel's transfer buffer.
    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            name_prefix: default_name_prefix(),
            log_dir: default_log_dir(),
            buffer_size: default_buffer_size(),
        }
    }
}

impl LoggerConfig {
    /// Load and validate configuration from a TOML file path.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the file cannot be read or contains
    /// invalid TOML, or if validation fails.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|err| {
            AppError::Config(format!("failed to read config {}: {err}", path.display()))
        })?;
        Self::from_toml_str(&raw)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if parsing or validation fails.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply command-line overrides on top of this configuration.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the resulting configuration is invalid.
    pub fn with_overrides(
        mut self,
        name_prefix: Option<String>,
        log_dir: Option<PathBuf>,
    ) -> Result<Self> {
        if let Some(prefix) = name_prefix {
            self.name_prefix = prefix;
        }
        if let Some(dir) = log_dir {
            self.log_dir = dir;
        }
        self.validate()?;
        Ok(self)
    }

    fn validate(&self) -> Result<()> {
        if self.name_prefix.is_empty() {
            return Err(AppError::Config("name_prefix must not be empty".into()));
        }

        if self.buffer_size == 0 {
            return Err(AppError::Config(
                "buffer_size must be greater than zero".into(),
            ));
        }

        Ok(())
    }
}
