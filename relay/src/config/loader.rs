use super::{DatabaseConfig, OwnerConfig, RelayConfig, UpstreamConfig};
use crate::auth::Credentials;
use crate::constants;
use crate::error::{RelayError, Result};
use std::path::PathBuf;
use std::str::FromStr;

type Lookup = Box<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Reads deployment settings from environment-style variables, every one with a default.
pub struct ConfigLoader {
    lookup: Lookup,
}

impl ConfigLoader {
    /// Process environment, after loading `.env` from the working directory if one exists.
    pub fn from_env() -> Self {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!("Loaded environment overrides from {}", path.display());
        }
        Self::with_lookup(|key| std::env::var(key).ok())
    }

    pub fn with_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        Self {
            lookup: Box::new(lookup),
        }
    }

    fn string(&self, key: &str, default: &str) -> String {
        (self.lookup)(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| default.to_string())
    }

    fn parsed<T: FromStr>(&self, key: &str, default: T) -> Result<T>
    where
        T::Err: std::fmt::Display,
    {
        match (self.lookup)(key).map(|v| v.trim().to_string()) {
            Some(raw) if !raw.is_empty() => raw
                .parse()
                .map_err(|e| RelayError::Config(format!("{}={:?}: {}", key, raw, e))),
            _ => Ok(default),
        }
    }

    fn credentials(&self) -> Credentials {
        Credentials::new(
            self.string("N8N_DEFAULT_EMAIL", "admin@example.com"),
            self.string("N8N_DEFAULT_PASSWORD", "changeme"),
        )
    }

    pub fn upstream(&self) -> Result<UpstreamConfig> {
        let upstream = UpstreamConfig {
            protocol: self.string("N8N_PROTOCOL", "http").parse()?,
            host: self.string("N8N_HOST", "n8n"),
            port: self.parsed("N8N_PORT", 5678)?,
        };

        reqwest::Url::parse(&upstream.base_url())
            .map_err(|e| RelayError::InvalidUrl(format!("{}: {}", upstream.base_url(), e)))?;

        Ok(upstream)
    }

    pub fn relay(&self) -> Result<RelayConfig> {
        let control_port: u16 =
            self.parsed("RELAY_CONTROL_PORT", constants::network::DEFAULT_CONTROL_PORT)?;

        Ok(RelayConfig {
            upstream: self.upstream()?,
            credentials: self.credentials(),
            proxy_port: self.parsed("PROXY_PORT", constants::network::DEFAULT_PROXY_PORT)?,
            control_port: (control_port != 0).then_some(control_port),
            platform_name: self.string("RELAY_PLATFORM_NAME", "n8n").to_lowercase(),
            log_dir: self.log_dir(),
        })
    }

    pub fn database(&self) -> Result<DatabaseConfig> {
        Ok(DatabaseConfig {
            host: self.string("DB_POSTGRESDB_HOST", "postgres"),
            port: self.parsed("DB_POSTGRESDB_PORT", 5432)?,
            database: self.string("DB_POSTGRESDB_DATABASE", "n8n"),
            user: self.string("DB_POSTGRESDB_USER", "n8n"),
            password: self.string("DB_POSTGRESDB_PASSWORD", "n8n"),
        })
    }

    pub fn owner(&self) -> OwnerConfig {
        OwnerConfig {
            credentials: self.credentials(),
            first_name: self.string("N8N_DEFAULT_FIRST_NAME", "Admin"),
            last_name: self.string("N8N_DEFAULT_LAST_NAME", "User"),
        }
    }

    pub fn log_dir(&self) -> Option<PathBuf> {
        (self.lookup)("RELAY_LOG_DIR")
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
    }
}
