//! Process settings loaded via OrthoConfig.
//!
//! Values come from `REWEAR_*` environment variables, command-line flags and
//! an optional configuration file. Session cookie settings are read
//! separately, see `rewear_backend::inbound::http::session_config`.

use std::net::SocketAddr;

use ortho_config::OrthoConfig;
use serde::Deserialize;

use super::config::DEFAULT_LOGIN_PASSWORD;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_POOL_SIZE: u32 = 10;

/// Errors raised while interpreting loaded settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("invalid bind address '{value}': {source}")]
    BindAddr {
        value: String,
        #[source]
        source: std::net::AddrParseError,
    },
    #[error("pool size must be at least 1")]
    PoolSize,
}

/// Settings controlling how the server starts.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "REWEAR")]
pub struct AppSettings {
    /// Socket address to listen on.
    pub bind_addr: Option<String>,
    /// PostgreSQL connection string. The in-memory store is used when unset.
    pub database_url: Option<String>,
    /// Maximum number of pooled database connections.
    pub pool_size: Option<u32>,
    /// Shared password accepted by the login endpoint.
    pub login_password: Option<String>,
    /// Seed demo accounts and listings into the in-memory store.
    #[ortho_config(default = false)]
    pub seed_demo_data: bool,
}

impl AppSettings {
    /// Parse the configured bind address, falling back to `0.0.0.0:8080`.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::BindAddr`] for an unparsable address.
    pub fn bind_addr(&self) -> Result<SocketAddr, SettingsError> {
        let value = self.bind_addr.as_deref().unwrap_or(DEFAULT_BIND_ADDR);
        value.parse().map_err(|source| SettingsError::BindAddr {
            value: value.to_owned(),
            source,
        })
    }

    /// Return the configured pool size, falling back to ten connections.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::PoolSize`] when zero is configured.
    pub fn pool_size(&self) -> Result<u32, SettingsError> {
        match self.pool_size.unwrap_or(DEFAULT_POOL_SIZE) {
            0 => Err(SettingsError::PoolSize),
            size => Ok(size),
        }
    }

    /// Return the shared login password.
    pub fn login_password(&self) -> &str {
        self.login_password
            .as_deref()
            .unwrap_or(DEFAULT_LOGIN_PASSWORD)
    }

    /// Return the database URL when one is configured and non-blank.
    pub fn database_url(&self) -> Option<&str> {
        self.database_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }
}
