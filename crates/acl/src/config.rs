//! Configuration
//!
//! [`AclConfig`] is read from TOML (every field optional) and may then be
//! overridden from `CREDGATE_*` environment variables.
//!
//! ```toml
//! serialize_upserts = true
//! rotation_batch_size = 50
//!
//! [log]
//! level = "info,credgate_acl=debug"
//! format = "json"
//! ```

use crate::core::{ConfigError, ROTATION_BATCH_SIZE};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Largest accepted rotation page size
pub const MAX_ROTATION_BATCH_SIZE: usize = 1000;

/// Environment variable overriding [`LogConfig::level`]
pub const ENV_LOG_LEVEL: &str = "CREDGATE_LOG_LEVEL";
/// Environment variable overriding [`LogConfig::format`]
pub const ENV_LOG_FORMAT: &str = "CREDGATE_LOG_FORMAT";
/// Environment variable overriding [`AclConfig::serialize_upserts`]
pub const ENV_SERIALIZE_UPSERTS: &str = "CREDGATE_SERIALIZE_UPSERTS";
/// Environment variable overriding [`AclConfig::rotation_batch_size`]
pub const ENV_ROTATION_BATCH_SIZE: &str = "CREDGATE_ROTATION_BATCH_SIZE";

/// Access-control configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AclConfig {
    /// Serialize grants and deletes of one (credential, actor) pair in
    /// process. Stores merge grants atomically either way; this only orders
    /// a grant and a delete racing on the same pair.
    pub serialize_upserts: bool,

    /// Page size used when walking versions that need re-encryption
    pub rotation_batch_size: usize,

    /// Logging configuration
    pub log: LogConfig,
}

impl Default for AclConfig {
    fn default() -> Self {
        Self {
            serialize_upserts: true,
            rotation_batch_size: ROTATION_BATCH_SIZE,
            log: LogConfig::default(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Filter directives (e.g., "info", "debug,sqlx=warn")
    pub level: String,

    /// Output format
    pub format: Format,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: Format::Compact,
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    /// Human-readable, multi-line
    Pretty,
    /// Single-line output
    Compact,
    /// Structured JSON output
    Json,
}

impl std::str::FromStr for Format {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "compact" => Ok(Self::Compact),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::InvalidValue {
                field: "log.format".into(),
                reason: format!("unknown format '{other}', expected pretty, compact or json"),
            }),
        }
    }
}

impl AclConfig {
    /// Parse a TOML document and validate it
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io { source })?;
        Self::from_toml_str(&text)
    }

    /// Override fields from `CREDGATE_*` environment variables
    pub fn apply_env(self) -> Result<Self, ConfigError> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Override fields from a variable lookup; unset variables are skipped
    pub fn apply_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(level) = lookup(ENV_LOG_LEVEL) {
            self.log.level = level;
        }

        if let Some(format) = lookup(ENV_LOG_FORMAT) {
            self.log.format = format.parse()?;
        }

        if let Some(value) = lookup(ENV_SERIALIZE_UPSERTS) {
            self.serialize_upserts = parse_bool(ENV_SERIALIZE_UPSERTS, &value)?;
        }

        if let Some(value) = lookup(ENV_ROTATION_BATCH_SIZE) {
            self.rotation_batch_size = value.trim().parse().map_err(|_| ConfigError::InvalidValue {
                field: ENV_ROTATION_BATCH_SIZE.into(),
                reason: format!("'{value}' is not a positive integer"),
            })?;
        }

        self.validate()?;
        Ok(self)
    }

    /// Validate configuration parameters
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rotation_batch_size == 0 || self.rotation_batch_size > MAX_ROTATION_BATCH_SIZE {
            return Err(ConfigError::InvalidValue {
                field: "rotation_batch_size".into(),
                reason: format!("must be between 1 and {MAX_ROTATION_BATCH_SIZE}"),
            });
        }

        if self.log.level.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "log.level".into(),
                reason: "cannot be empty".into(),
            });
        }

        Ok(())
    }
}

fn parse_bool(field: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            field: field.into(),
            reason: format!("'{value}' is not a boolean"),
        }),
    }
}
