//! Core types for OxideLog

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::constants::{FORWARDED_FOR_HEADER, USER_AGENT_HEADER};
use crate::error::{Error, Result};

/// Severity of an application log message.
///
/// Ordering is numeric: `Debug < Info < Warn < Error < Fatal`. A message is
/// written when the configured minimum is less than or equal to its level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "LevelRepr", rename_all = "UPPERCASE")]
pub enum Level {
    Debug = 0,
    Info = 1,
    Warn = 2,
    Error = 3,
    Fatal = 5,
}

impl Level {
    /// Levels accepted as a minimum threshold (everything but `Fatal`)
    pub const FILTERABLE: [Level; 4] = [Level::Debug, Level::Info, Level::Warn, Level::Error];

    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Debug => "DEBUG",
            Level::Info => "INFO",
            Level::Warn => "WARN",
            Level::Error => "ERROR",
            Level::Fatal => "FATAL",
        }
    }

    /// Whether this level can be used as the minimum threshold
    pub fn is_filterable(&self) -> bool {
        !matches!(self, Level::Fatal)
    }

    /// Whether a message at `level` passes this threshold
    pub fn allows(&self, level: Level) -> bool {
        *self <= level
    }
}

impl Default for Level {
    fn default() -> Self {
        Level::Info
    }
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Level {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "debug" | "0" => Ok(Level::Debug),
            "info" | "1" => Ok(Level::Info),
            "warn" | "warning" | "2" => Ok(Level::Warn),
            "error" | "3" => Ok(Level::Error),
            "fatal" | "5" => Ok(Level::Fatal),
            _ => Err(Error::InvalidLevel(s.to_string())),
        }
    }
}

impl TryFrom<u8> for Level {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(Level::Debug),
            1 => Ok(Level::Info),
            2 => Ok(Level::Warn),
            3 => Ok(Level::Error),
            5 => Ok(Level::Fatal),
            other => Err(Error::InvalidLevel(other.to_string())),
        }
    }
}

/// Config files may spell a level by name or by number
#[derive(Deserialize)]
#[serde(untagged)]
enum LevelRepr {
    Name(String),
    Number(u8),
}

impl TryFrom<LevelRepr> for Level {
    type Error = Error;

    fn try_from(repr: LevelRepr) -> Result<Self> {
        match repr {
            LevelRepr::Name(name) => name.parse(),
            LevelRepr::Number(n) => Level::try_from(n),
        }
    }
}

/// Request metadata recorded on the access log
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestMeta {
    pub method: String,
    pub url: String,
    pub protocol: String,
    /// Raw peer address of the connection
    pub remote_addr: String,
    /// Value of the `X-Forwarded-For` header, if any
    pub forwarded_for: Option<String>,
    /// Value of the `User-Agent` header, if any
    pub user_agent: Option<String>,
}

impl RequestMeta {
    pub fn new(
        method: impl Into<String>,
        url: impl Into<String>,
        protocol: impl Into<String>,
        remote_addr: impl Into<String>,
    ) -> Self {
        Self {
            method: method.into(),
            url: url.into(),
            protocol: protocol.into(),
            remote_addr: remote_addr.into(),
            forwarded_for: None,
            user_agent: None,
        }
    }

    pub fn with_forwarded_for(mut self, value: impl Into<String>) -> Self {
        self.forwarded_for = Some(value.into());
        self
    }

    pub fn with_user_agent(mut self, value: impl Into<String>) -> Self {
        self.user_agent = Some(value.into());
        self
    }

    /// Build from an `http` request; `peer` is the socket address the
    /// request arrived on.
    pub fn from_http<B>(req: &http::Request<B>, peer: impl Into<String>) -> Self {
        let header = |name: &str| {
            req.headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };

        Self {
            method: req.method().to_string(),
            url: req.uri().to_string(),
            protocol: format!("{:?}", req.version()),
            remote_addr: peer.into(),
            forwarded_for: header(FORWARDED_FOR_HEADER),
            user_agent: header(USER_AGENT_HEADER),
        }
    }

    /// Client address: the forwarded-for value when present and non-blank,
    /// otherwise the raw peer address.
    pub fn client_address(&self) -> &str {
        match self.forwarded_for.as_deref() {
            Some(fwd) if !fwd.trim().is_empty() => fwd,
            _ => &self.remote_addr,
        }
    }

    pub fn user_agent(&self) -> &str {
        self.user_agent.as_deref().unwrap_or("")
    }
}
