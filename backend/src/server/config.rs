//! HTTP server configuration object and helpers.

use actix_web::cookie::{Key, SameSite};
use rewear_backend::outbound::persistence::DbPool;
use std::net::SocketAddr;

#[cfg(feature = "metrics")]
use actix_web_prom::PrometheusMetrics;

/// Password accepted for every account when none is configured.
pub const DEFAULT_LOGIN_PASSWORD: &str = "password";

/// Builder-style configuration for creating the HTTP server.
pub struct ServerConfig {
    pub(crate) key: Key,
    pub(crate) cookie_secure: bool,
    pub(crate) same_site: SameSite,
    pub(crate) bind_addr: SocketAddr,
    pub(crate) db_pool: Option<DbPool>,
    pub(crate) login_password: String,
    pub(crate) seed_demo_data: bool,
    #[cfg(feature = "metrics")]
    pub(crate) prometheus: Option<PrometheusMetrics>,
}

impl ServerConfig {
    /// Construct a server configuration backed by the in-memory store.
    #[must_use]
    pub fn new(key: Key, cookie_secure: bool, same_site: SameSite, bind_addr: SocketAddr) -> Self {
        Self {
            key,
            cookie_secure,
            same_site,
            bind_addr,
            db_pool: None,
            login_password: DEFAULT_LOGIN_PASSWORD.to_owned(),
            seed_demo_data: false,
            #[cfg(feature = "metrics")]
            prometheus: None,
        }
    }

    /// Attach a database connection pool.
    ///
    /// When provided, items, accounts and swaps are stored in PostgreSQL
    /// instead of the in-memory store.
    #[must_use]
    pub fn with_db_pool(mut self, pool: DbPool) -> Self {
        self.db_pool = Some(pool);
        self
    }

    /// Set the shared login password checked by the login endpoint.
    #[must_use]
    pub fn with_login_password(mut self, password: impl Into<String>) -> Self {
        self.login_password = password.into();
        self
    }

    /// Seed demo accounts and listings into the in-memory store at startup.
    ///
    /// Ignored when a database pool is attached.
    #[must_use]
    pub fn with_demo_data(mut self, enabled: bool) -> Self {
        self.seed_demo_data = enabled;
        self
    }

    /// Return the socket address the server will bind to.
    #[must_use]
    pub fn bind_addr(&self) -> SocketAddr {
        self.bind_addr
    }

    #[cfg(feature = "metrics")]
    /// Attach Prometheus middleware to the configuration.
    #[must_use]
    pub fn with_metrics(mut self, prometheus: Option<PrometheusMetrics>) -> Self {
        self.prometheus = prometheus;
        self
    }
}
