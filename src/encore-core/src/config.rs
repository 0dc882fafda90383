use crate::models::StreamQuality;
use crate::paths::AppDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use thiserror::Error;

const CURRENT_CONFIG_VERSION: u32 = 1;

/// Cache expiry bounds, in minutes.
const MIN_CACHE_EXPIRY_MINUTES: u32 = 1;
const MAX_CACHE_EXPIRY_MINUTES: u32 = 3600;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_config_version")]
    pub config_version: u32,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub cantio: CantioConfig,
    #[serde(default)]
    pub suggester: SuggesterConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            config_version: default_config_version(),
            logging: LoggingConfig::default(),
            cantio: CantioConfig::default(),
            suggester: SuggesterConfig::default(),
        }
    }
}

/// Settings for the Cantio catalog provider.
///
/// The password and any persisted session token live in the OS keyring, not
/// here (see `secrets`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CantioConfig {
    #[serde(default)]
    pub base_url: String,
    /// Account username or email.
    #[serde(default)]
    pub username: String,
    /// Device identity registered with the catalog.
    #[serde(default)]
    pub device_id: String,
    #[serde(default)]
    pub quality: StreamQuality,
    /// Minutes a cached song may stay idle before it is evicted and its
    /// downloaded file deleted.
    #[serde(default = "default_cache_expiry_minutes")]
    pub cache_expiry_minutes: u32,
}

impl Default for CantioConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            username: String::new(),
            device_id: String::new(),
            quality: StreamQuality::default(),
            cache_expiry_minutes: default_cache_expiry_minutes(),
        }
    }
}

/// Settings for the station suggester.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SuggesterConfig {
    /// Id of the track the first station is built on.
    #[serde(default)]
    pub fallback_seed: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: LogLevel,
    #[serde(default = "default_max_log_files")]
    pub max_log_files: usize,
    #[serde(default = "default_stdout_enabled")]
    pub stdout: bool,
    #[serde(default)]
    pub file_name: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            max_log_files: default_max_log_files(),
            stdout: default_stdout_enabled(),
            file_name: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_filter_directive(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("config validation failed: {0}")]
    Validation(ValidationError),
    #[error("failed to prepare configuration directories: {0}")]
    Directories(#[from] crate::paths::DirsError),
}

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("unsupported config_version {found}, expected {expected}")]
    UnsupportedVersion { found: u32, expected: u32 },
    #[error("cache_expiry_minutes {minutes} out of range (1..=3600)")]
    CacheExpiryOutOfRange { minutes: u32 },
    #[error("fallback_seed {id:?} is not a Cantio track id (expected 'T...')")]
    InvalidFallbackSeed { id: String },
}

impl Config {
    pub fn load_or_default(dirs: &AppDirs) -> Result<Self, ConfigError> {
        dirs.ensure_exists()?;
        let path = Self::config_path(dirs);
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path).map_err(|source| ConfigError::Io {
            path: path.clone(),
            source,
        })?;
        let config: Config = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.clone(),
            source,
        })?;
        config.validate().map_err(ConfigError::Validation)?;
        Ok(config)
    }

    pub fn config_path(dirs: &AppDirs) -> PathBuf {
        dirs.config_dir().join("config.toml")
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.config_version != CURRENT_CONFIG_VERSION {
            return Err(ValidationError::UnsupportedVersion {
                found: self.config_version,
                expected: CURRENT_CONFIG_VERSION,
            });
        }
        let minutes = self.cantio.cache_expiry_minutes;
        if !(MIN_CACHE_EXPIRY_MINUTES..=MAX_CACHE_EXPIRY_MINUTES).contains(&minutes) {
            return Err(ValidationError::CacheExpiryOutOfRange { minutes });
        }
        if let Some(seed) = &self.suggester.fallback_seed {
            if !is_catalog_track_id(seed) {
                return Err(ValidationError::InvalidFallbackSeed { id: seed.clone() });
            }
        }
        Ok(())
    }
}

/// Cantio track ids start with `T` followed by at least one character.
pub fn is_catalog_track_id(id: &str) -> bool {
    id.len() > 1 && id.starts_with('T')
}

fn default_config_version() -> u32 {
    CURRENT_CONFIG_VERSION
}

fn default_cache_expiry_minutes() -> u32 {
    60
}

fn default_log_level() -> LogLevel {
    LogLevel::Info
}

fn default_max_log_files() -> usize {
    7
}

fn default_stdout_enabled() -> bool {
    true
}
