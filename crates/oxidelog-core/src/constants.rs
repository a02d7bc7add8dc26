//! Constants and default values for OxideLog

use std::path::PathBuf;

/// Base name of the live application log
pub const APP_LOG_NAME: &str = "application.log";

/// Base name of the live access log
pub const ACCESS_LOG_NAME: &str = "access.log";

/// Default folder for both log streams
pub const DEFAULT_LOG_FOLDER: &str = "/var/log";

/// Default max size of a live log file in KB (1MB)
pub const DEFAULT_MAX_SIZE_KB: u64 = 1024;

/// Default retention for archived files in days
pub const DEFAULT_MAX_AGE_DAYS: u32 = 10;

/// Default number of dispatcher workers per stream
pub const DEFAULT_WORKERS: usize = 5;

/// Default capacity of the application log channel
pub const DEFAULT_APP_CHANNEL_CAPACITY: usize = 1000;

/// Default capacity of the access log channel (0 = rendezvous)
pub const DEFAULT_ACCESS_CHANNEL_CAPACITY: usize = 0;

/// Default interval between purge scans in seconds
pub const DEFAULT_PURGE_INTERVAL_SECS: u64 = 60;

/// Timestamp layout used on every log line
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Date layout used in archive file names
pub const ARCHIVE_DATE_FORMAT: &str = "%Y-%m-%d";

/// Header carrying the original client address behind a proxy
pub const FORWARDED_FOR_HEADER: &str = "X-Forwarded-For";

/// Header carrying the client user agent
pub const USER_AGENT_HEADER: &str = "User-Agent";

/// Default config file names to search for (in priority order)
pub const CONFIG_FILES: &[&str] = &[
    "oxidelog.toml",
    "oxidelog.yaml",
    "oxidelog.yml",
    "oxidelog.json",
];

/// Get the default log folder
pub fn default_log_folder() -> PathBuf {
    PathBuf::from(DEFAULT_LOG_FOLDER)
}
