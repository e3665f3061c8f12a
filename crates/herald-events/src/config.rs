//! Emitter configuration.
//!
//! ```toml
//! scheduler = "priority"
//! catch_exceptions = true
//! worker_name = "audit-drain"
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ConfigError, ConfigResult};
use crate::scheduler::SchedulerKind;

/// Maximum accepted size for a configuration file, in bytes.
const MAX_CONFIG_FILE_SIZE: u64 = 65_536;

/// Construction-time settings shared by both emitter flavours.
///
/// Runtime values (custom identity, failure hook, custom scheduler
/// instances) are set on the builders instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EmitterConfig {
    /// Scheduler used by asynchronous emitters.
    #[serde(default)]
    pub scheduler: SchedulerKind,
    /// Route per-listener failures to the failure hook.
    #[serde(default)]
    pub catch_exceptions: bool,
    /// Name given to the drain worker thread.
    #[serde(default = "default_worker_name")]
    pub worker_name: String,
}

fn default_worker_name() -> String {
    "herald-drain".to_string()
}

impl Default for EmitterConfig {
    fn default() -> Self {
        Self {
            scheduler: SchedulerKind::default(),
            catch_exceptions: false,
            worker_name: default_worker_name(),
        }
    }
}

impl EmitterConfig {
    /// Parse and validate a configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ParseError`] for malformed TOML or unknown
    /// fields, and [`ConfigError::ValidationError`] for invalid values.
    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        Self::parse(content, "<inline>")
    }

    /// Read, parse and validate a configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ReadError`] if the file cannot be read, plus
    /// the errors of [`EmitterConfig::from_toml_str`].
    pub fn load_file(path: &Path) -> ConfigResult<Self> {
        let metadata = std::fs::metadata(path).map_err(|e| ConfigError::ReadError {
            path: path.display().to_string(),
            source: e,
        })?;
        if metadata.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::ValidationError {
                field: path.display().to_string(),
                message: format!(
                    "config file is {} bytes, exceeding the {MAX_CONFIG_FILE_SIZE} byte limit",
                    metadata.len()
                ),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.display().to_string(),
            source: e,
        })?;

        let config = Self::parse(&content, &path.display().to_string())?;
        debug!(path = %path.display(), scheduler = %config.scheduler, "Loaded emitter config");
        Ok(config)
    }

    /// Check field values.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ValidationError`] if `worker_name` is blank or
    /// contains a NUL byte (thread names cannot).
    pub fn validate(&self) -> ConfigResult<()> {
        if self.worker_name.trim().is_empty() {
            return Err(ConfigError::ValidationError {
                field: "worker_name".to_string(),
                message: "must not be empty".to_string(),
            });
        }
        if self.worker_name.contains('\0') {
            return Err(ConfigError::ValidationError {
                field: "worker_name".to_string(),
                message: "must not contain NUL bytes".to_string(),
            });
        }
        Ok(())
    }

    fn parse(content: &str, origin: &str) -> ConfigResult<Self> {
        let config: Self = toml::from_str(content).map_err(|e| ConfigError::ParseError {
            path: origin.to_string(),
            source: e,
        })?;
        config.validate()?;
        Ok(config)
    }
}
