//! YAML configuration for the client.
//!
//! Every section and field has a default, so an empty file (or no file at
//! all) yields a working local setup.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{UnitId, ViewMode};

/// Config file looked up in the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "condofin.yaml";

/// Widest period picker we accept, in months on either side.
pub const MAX_PERIOD_SPAN: u32 = 120;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("File not found: {path}")]
    FileNotFound { path: String },

    #[error("Failed to read {path}: {reason}")]
    Io { path: String, reason: String },

    #[error("Invalid YAML format: {0}")]
    InvalidYaml(#[from] serde_yaml::Error),

    #[error("Invalid field value: {field} - {reason}")]
    InvalidValue { field: String, reason: String },
}

/// Backend connection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Bearer token sent with every request
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            token: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:8000/api/v1".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

/// Local response cache
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_cache_path")]
    pub path: PathBuf,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            path: default_cache_path(),
            enabled: true,
        }
    }
}

fn default_cache_path() -> PathBuf {
    PathBuf::from("condofin.db")
}

fn default_true() -> bool {
    true
}

/// Filter behaviour and the period picker span
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FiltersConfig {
    /// Reject malformed periods instead of ignoring them
    #[serde(default)]
    pub strict_periods: bool,
    #[serde(default = "default_months_back")]
    pub months_back: u32,
    #[serde(default = "default_months_forward")]
    pub months_forward: u32,
}

impl Default for FiltersConfig {
    fn default() -> Self {
        Self {
            strict_periods: false,
            months_back: default_months_back(),
            months_forward: default_months_forward(),
        }
    }
}

fn default_months_back() -> u32 {
    12
}

fn default_months_forward() -> u32 {
    1
}

/// Who is looking at the screen
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_role")]
    pub role: String,
    #[serde(default)]
    pub unit_id: Option<UnitId>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            role: default_role(),
            unit_id: None,
        }
    }
}

impl SessionConfig {
    pub fn view_mode(&self) -> ViewMode {
        ViewMode::from_role(&self.role)
    }
}

fn default_role() -> String {
    "admin".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub filters: FiltersConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::FileNotFound {
                    path: path.display().to_string(),
                }
            } else {
                ConfigError::Io {
                    path: path.display().to_string(),
                    reason: e.to_string(),
                }
            }
        })?;
        Self::from_yaml(&content)
    }

    /// Load an explicit path strictly; without one, use `condofin.yaml` when
    /// it exists and defaults otherwise.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None => {
                let implicit = Path::new(DEFAULT_CONFIG_FILE);
                if implicit.exists() {
                    Self::load(implicit)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api.base_url.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "api.base_url".to_string(),
                reason: "Base URL must not be empty".to_string(),
            });
        }

        if self.api.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "api.timeout_secs".to_string(),
                reason: "Timeout must be greater than 0".to_string(),
            });
        }

        for (field, value) in [
            ("filters.months_back", self.filters.months_back),
            ("filters.months_forward", self.filters.months_forward),
        ] {
            if value > MAX_PERIOD_SPAN {
                return Err(ConfigError::InvalidValue {
                    field: field.to_string(),
                    reason: format!("Must be at most {} months", MAX_PERIOD_SPAN),
                });
            }
        }

        if self.logging.level.parse::<log::LevelFilter>().is_err() {
            return Err(ConfigError::InvalidValue {
                field: "logging.level".to_string(),
                reason: format!("Unknown log level '{}'", self.logging.level),
            });
        }

        Ok(())
    }
}
