//! Error types for OxideLog

use std::path::{Path, PathBuf};

/// OxideLog error type
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Cannot open log file {path}: {source}")]
    StartupIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Write failed on {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Rotation failed for {path}: {source}")]
    Rotation {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Purge failed in {path}: {source}")]
    Purge {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid log level: {0}")]
    InvalidLevel(String),

    #[error("Invalid size: {0}")]
    InvalidSize(String),

    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("Config file not found: {0}")]
    ConfigNotFound(PathBuf),

    #[error("Engine already running")]
    AlreadyRunning,

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("YAML parse error: {0}")]
    YamlError(#[from] serde_yaml::Error),
}

/// Result type alias for OxideLog
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Error::ConfigError(msg.into())
    }

    pub fn startup_io(path: &Path, source: std::io::Error) -> Self {
        Error::StartupIo {
            path: path.to_path_buf(),
            source,
        }
    }

    pub fn write(path: &Path, source: std::io::Error) -> Self {
        Error::Write {
            path: path.to_path_buf(),
            source,
        }
    }

    pub fn rotation(path: &Path, source: std::io::Error) -> Self {
        Error::Rotation {
            path: path.to_path_buf(),
            source,
        }
    }

    pub fn purge(path: &Path, source: std::io::Error) -> Self {
        Error::Purge {
            path: path.to_path_buf(),
            source,
        }
    }
}
