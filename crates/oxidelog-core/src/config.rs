//! Engine configuration for OxideLog
//!
//! The configuration is a plain value built once before the engine starts.
//! It can be assembled in code through the `with_*` setters or loaded from
//! a file in one of the supported formats:
//! - TOML (.toml)
//! - YAML (.yaml, .yml)
//! - JSON (.json)

use serde::{Deserialize, Deserializer, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::constants::*;
use crate::error::{Error, Result};
use crate::types::Level;

/// Supported configuration file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Toml,
    Yaml,
    Json,
}

impl ConfigFormat {
    /// Detect format from file extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "toml" => Some(ConfigFormat::Toml),
            "yaml" | "yml" => Some(ConfigFormat::Yaml),
            "json" => Some(ConfigFormat::Json),
            _ => None,
        }
    }

    /// Detect format from file path
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }
}

/// Settings of one log stream (application or access)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    /// Folder holding the live file and its archives
    pub folder: PathBuf,
    /// Rotation threshold in KB; accepts `"512KB"` / `"10MB"` in files
    #[serde(alias = "max_size", deserialize_with = "deserialize_size_kb")]
    pub max_size_kb: u64,
    /// Archives older than this many days are purged (0 disables purging)
    pub max_age_days: u32,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            folder: default_log_folder(),
            max_size_kb: DEFAULT_MAX_SIZE_KB,
            max_age_days: DEFAULT_MAX_AGE_DAYS,
        }
    }
}

impl StreamConfig {
    pub fn max_size_bytes(&self) -> u64 {
        self.max_size_kb.saturating_mul(1024)
    }
}

/// Full engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Application log stream (`application.log`)
    pub app: StreamConfig,
    /// Access log stream (`access.log`)
    #[serde(alias = "public")]
    pub access: StreamConfig,
    /// Minimum level written to the application log
    pub min_level: Level,
    /// Echo every line to stdout as well
    pub mirror_to_stdout: bool,
    /// Append ` at file:line` to application log lines
    pub caller_location: bool,
    /// Dispatcher workers per stream. With more than one worker the order of
    /// lines in the file is not guaranteed; use 1 for strict FIFO.
    pub workers: usize,
    pub app_channel_capacity: usize,
    /// 0 makes every access-log call wait for a worker
    pub access_channel_capacity: usize,
    pub purge_interval_secs: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            app: StreamConfig::default(),
            access: StreamConfig::default(),
            min_level: Level::Info,
            mirror_to_stdout: true,
            caller_location: true,
            workers: DEFAULT_WORKERS,
            app_channel_capacity: DEFAULT_APP_CHANNEL_CAPACITY,
            access_channel_capacity: DEFAULT_ACCESS_CHANNEL_CAPACITY,
            purge_interval_secs: DEFAULT_PURGE_INTERVAL_SECS,
        }
    }
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Put both streams in the same folder
    pub fn with_log_folder(self, folder: impl Into<PathBuf>) -> Self {
        let folder = folder.into();
        self.with_app_log_folder(folder.clone())
            .with_public_log_folder(folder)
    }

    pub fn with_app_log_folder(mut self, folder: impl Into<PathBuf>) -> Self {
        self.app.folder = folder.into();
        self
    }

    pub fn with_app_log_max_size_kb(mut self, kb: u64) -> Self {
        self.app.max_size_kb = kb;
        self
    }

    pub fn with_app_log_max_age_days(mut self, days: u32) -> Self {
        self.app.max_age_days = days;
        self
    }

    pub fn with_public_log_folder(mut self, folder: impl Into<PathBuf>) -> Self {
        self.access.folder = folder.into();
        self
    }

    pub fn with_public_log_max_size_kb(mut self, kb: u64) -> Self {
        self.access.max_size_kb = kb;
        self
    }

    pub fn with_public_log_max_age_days(mut self, days: u32) -> Self {
        self.access.max_age_days = days;
        self
    }

    /// Set the minimum application log level.
    ///
    /// # Panics
    ///
    /// Panics when given [`Level::Fatal`]: fatal messages are always written,
    /// so using it as a threshold is a programming error.
    pub fn with_min_level(mut self, level: Level) -> Self {
        assert!(
            level.is_filterable(),
            "invalid minimum log level {level}: expected DEBUG, INFO, WARN or ERROR"
        );
        self.min_level = level;
        self
    }

    pub fn with_mirror_to_stdout(mut self, enabled: bool) -> Self {
        self.mirror_to_stdout = enabled;
        self
    }

    pub fn with_caller_location(mut self, enabled: bool) -> Self {
        self.caller_location = enabled;
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_app_channel_capacity(mut self, capacity: usize) -> Self {
        self.app_channel_capacity = capacity;
        self
    }

    pub fn with_access_channel_capacity(mut self, capacity: usize) -> Self {
        self.access_channel_capacity = capacity;
        self
    }

    pub fn with_purge_interval(mut self, interval: Duration) -> Self {
        self.purge_interval_secs = interval.as_secs().max(1);
        self
    }

    pub fn purge_interval(&self) -> Duration {
        Duration::from_secs(self.purge_interval_secs)
    }

    /// Reject settings the engine cannot run with
    pub fn validate(&self) -> Result<()> {
        if !self.min_level.is_filterable() {
            return Err(Error::InvalidLevel(self.min_level.to_string()));
        }
        if self.workers == 0 {
            return Err(Error::config("workers must be at least 1"));
        }
        if self.app.max_size_kb == 0 || self.access.max_size_kb == 0 {
            return Err(Error::config("max size must be at least 1KB"));
        }
        if self.purge_interval_secs == 0 {
            return Err(Error::config("purge interval must be at least 1 second"));
        }
        Ok(())
    }

    /// Load config from file, automatically detecting format from extension
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::ConfigNotFound(path.to_path_buf()));
        }

        let format = ConfigFormat::from_path(path).ok_or_else(|| {
            Error::ConfigError(format!(
                "Unsupported config file extension: {}. Expected .toml, .yaml, .yml, or .json",
                path.display()
            ))
        })?;

        let content = std::fs::read_to_string(path)?;
        Self::parse(&content, format)
    }

    /// Parse config content with specified format
    pub fn parse(content: &str, format: ConfigFormat) -> Result<Self> {
        let config: EngineConfig = match format {
            ConfigFormat::Toml => toml::from_str(content)?,
            ConfigFormat::Yaml => serde_yaml::from_str(content)?,
            ConfigFormat::Json => serde_json::from_str(content)?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Find and load a config file from a directory
    pub fn find_and_load(dir: &Path) -> Result<(Self, PathBuf)> {
        for name in CONFIG_FILES {
            let path = dir.join(name);
            if path.exists() {
                let config = Self::load(&path)?;
                return Ok((config, path));
            }
        }
        Err(Error::ConfigError(format!(
            "No config file found in {}. Expected one of: {:?}",
            dir.display(),
            CONFIG_FILES
        )))
    }
}

/// Parse a size into KB. Bare numbers are KB; `K`/`KB`, `M`/`MB` and
/// `G`/`GB` suffixes are accepted in any case.
pub fn parse_size_kb(input: &str) -> Result<u64> {
    let s = input.trim().to_uppercase();
    let digits_end = s
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(s.len());
    let (number, unit) = s.split_at(digits_end);

    let value: u64 = number
        .parse()
        .map_err(|_| Error::InvalidSize(input.to_string()))?;

    let multiplier = match unit.trim() {
        "" | "K" | "KB" => 1,
        "M" | "MB" => 1024,
        "G" | "GB" => 1024 * 1024,
        _ => return Err(Error::InvalidSize(input.to_string())),
    };

    value
        .checked_mul(multiplier)
        .ok_or_else(|| Error::InvalidSize(input.to_string()))
}

fn deserialize_size_kb<'de, D>(deserializer: D) -> std::result::Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum SizeRepr {
        Kb(u64),
        Text(String),
    }

    match SizeRepr::deserialize(deserializer)? {
        SizeRepr::Kb(kb) => Ok(kb),
        SizeRepr::Text(text) => parse_size_kb(&text).map_err(serde::de::Error::custom),
    }
}
