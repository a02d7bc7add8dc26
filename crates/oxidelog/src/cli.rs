//! CLI argument definitions

use anyhow::{bail, Result};
use clap::{Args, Parser, Subcommand};
use oxidelog_core::{parse_size_kb, EngineConfig, Level, CONFIG_FILES};
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Parser)]
#[command(name = "oxidelog")]
#[command(version, about = "Asynchronous log writer with size rotation and age purge")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write application log messages through the engine
    Emit(EmitArgs),

    /// Write one access log record through the engine
    Access(AccessArgs),

    /// Write a FATAL message synchronously and exit with status 1
    Fatal(FatalArgs),

    /// Run one purge pass over both log folders
    Purge(EngineArgs),

    /// Validate and print the effective configuration
    Check(EngineArgs),
}

/// Settings shared by every command that builds an engine
#[derive(Args, Clone, Default)]
pub struct EngineArgs {
    /// Config file (.toml, .yaml, .yml, .json); defaults to oxidelog.* in the
    /// current directory
    #[arg(short, long, env = "OXIDELOG_CONFIG")]
    pub config: Option<PathBuf>,

    /// Folder for both application.log and access.log
    #[arg(long)]
    pub folder: Option<PathBuf>,

    /// Folder for application.log
    #[arg(long)]
    pub app_folder: Option<PathBuf>,

    /// Folder for access.log
    #[arg(long)]
    pub public_folder: Option<PathBuf>,

    /// Rotation size for both streams (e.g. 512KB, 10MB)
    #[arg(long, value_parser = parse_size)]
    pub max_size: Option<u64>,

    /// Archive retention in days for both streams (0 disables purging)
    #[arg(long)]
    pub max_age: Option<u32>,

    /// Minimum level written to application.log
    #[arg(long)]
    pub min_level: Option<Level>,

    /// Dispatcher workers per stream (1 keeps lines in order)
    #[arg(long)]
    pub workers: Option<usize>,

    /// Do not echo lines to stdout
    #[arg(long)]
    pub no_mirror: bool,

    /// Do not append the call site to application log lines
    #[arg(long)]
    pub no_location: bool,
}

fn parse_size(s: &str) -> std::result::Result<u64, String> {
    parse_size_kb(s).map_err(|e| e.to_string())
}

impl EngineArgs {
    /// Load the config file (if any) and apply command-line overrides
    pub fn resolve(&self) -> Result<EngineConfig> {
        let mut config = match &self.config {
            Some(path) => {
                debug!("Loading config from {}", path.display());
                EngineConfig::load(path)?
            }
            None if CONFIG_FILES.iter().any(|name| Path::new(name).exists()) => {
                let (config, path) = EngineConfig::find_and_load(Path::new("."))?;
                debug!("Found config file {}", path.display());
                config
            }
            None => EngineConfig::default(),
        };

        if let Some(folder) = &self.folder {
            config = config.with_log_folder(folder);
        }
        if let Some(folder) = &self.app_folder {
            config = config.with_app_log_folder(folder);
        }
        if let Some(folder) = &self.public_folder {
            config = config.with_public_log_folder(folder);
        }
        if let Some(kb) = self.max_size {
            config = config
                .with_app_log_max_size_kb(kb)
                .with_public_log_max_size_kb(kb);
        }
        if let Some(days) = self.max_age {
            config = config
                .with_app_log_max_age_days(days)
                .with_public_log_max_age_days(days);
        }
        if let Some(level) = self.min_level {
            if !level.is_filterable() {
                bail!("invalid minimum log level {}: expected DEBUG, INFO, WARN or ERROR", level);
            }
            config = config.with_min_level(level);
        }
        if let Some(workers) = self.workers {
            config = config.with_workers(workers);
        }
        if self.no_mirror {
            config = config.with_mirror_to_stdout(false);
        }
        if self.no_location {
            config = config.with_caller_location(false);
        }

        config.validate()?;
        Ok(config)
    }
}

#[derive(Args)]
pub struct EmitArgs {
    #[command(flatten)]
    pub engine: EngineArgs,

    /// Level of the emitted messages
    #[arg(short, long, default_value = "info")]
    pub level: Level,

    /// How many times to write the message (a sequence number is appended
    /// when greater than 1)
    #[arg(short = 'n', long, default_value = "1")]
    pub count: usize,

    /// Message text
    pub message: String,
}

#[derive(Args)]
pub struct AccessArgs {
    #[command(flatten)]
    pub engine: EngineArgs,

    /// HTTP method
    #[arg(long, default_value = "GET")]
    pub method: String,

    /// Protocol string
    #[arg(long, default_value = "HTTP/1.1")]
    pub protocol: String,

    /// Peer address of the connection
    #[arg(long, default_value = "127.0.0.1")]
    pub remote: String,

    /// X-Forwarded-For header value
    #[arg(long)]
    pub forwarded_for: Option<String>,

    /// User-Agent header value
    #[arg(long)]
    pub user_agent: Option<String>,

    /// Response status code
    #[arg(long, default_value = "200")]
    pub status: u16,

    /// Response content length in bytes
    #[arg(long, default_value = "0")]
    pub bytes: u64,

    /// Request duration in microseconds
    #[arg(long, default_value = "0")]
    pub duration_us: u64,

    /// Requested URL
    pub url: String,
}

#[derive(Args)]
pub struct FatalArgs {
    #[command(flatten)]
    pub engine: EngineArgs,

    /// Message text
    pub message: String,
}
