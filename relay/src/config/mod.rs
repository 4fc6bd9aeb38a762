pub mod loader;

pub use loader::ConfigLoader;

use crate::auth::Credentials;
use crate::error::RelayError;
use std::fmt;
use std::str::FromStr;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    Http,
    Https,
}

impl FromStr for Protocol {
    type Err = RelayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "http" => Ok(Protocol::Http),
            "https" => Ok(Protocol::Https),
            _ => Err(RelayError::Config(format!(
                "N8N_PROTOCOL must be http or https, got {:?}",
                s
            ))),
        }
    }
}

impl Protocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::Http => "http",
            Protocol::Https => "https",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where the relay forwards to. Fixed for the life of the process.
#[derive(Debug, Clone)]
pub struct UpstreamConfig {
    pub protocol: Protocol,
    pub host: String,
    pub port: u16,
}

impl UpstreamConfig {
    pub fn base_url(&self) -> String {
        format!("{}://{}:{}", self.protocol, self.host, self.port)
    }
}

#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub upstream: UpstreamConfig,
    pub credentials: Credentials,
    pub proxy_port: u16,
    /// `None` disables the control plane.
    pub control_port: Option<u16>,
    /// Substring that marks a cookie as a likely session cookie, next to "auth" and "session".
    pub platform_name: String,
    pub log_dir: Option<PathBuf>,
}

#[derive(Clone)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub user: String,
    pub password: String,
}

impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("user", &self.user)
            .field("password", &"***")
            .finish()
    }
}

/// The first administrative account, created by `create-owner`.
#[derive(Debug, Clone)]
pub struct OwnerConfig {
    pub credentials: Credentials,
    pub first_name: String,
    pub last_name: String,
}
