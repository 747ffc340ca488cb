//! Server settings loaded via OrthoConfig, and the runtime configuration
//! built from them.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use keyserver::inbound::http::state::HttpState;
use keyserver::outbound::memory::InMemoryIdentityStore;
use keyserver::outbound::persistence::{
    DbPool, DieselAuthorizedKeyRepository, DieselIdentityRepository, PoolConfig,
    run_pending_migrations,
};
use ortho_config::OrthoConfig;
use serde::Deserialize;
use tracing::{info, warn};

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8091";

/// Settings read from `KEYSERVER_*` environment variables, configuration
/// files and command-line flags.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "KEYSERVER")]
pub struct ServerSettings {
    /// PostgreSQL connection URL. Without it the in-memory store is used.
    pub database_url: Option<String>,
    /// Socket address the HTTP server binds to.
    pub bind_addr: Option<String>,
    /// Maximum number of pooled database connections.
    #[ortho_config(default = 10)]
    pub pool_max_size: u32,
    /// Apply pending migrations at startup.
    #[ortho_config(default = true)]
    pub run_migrations: bool,
}

impl ServerSettings {
    /// Configured bind address, falling back to `0.0.0.0:8091`.
    pub fn bind_addr(&self) -> io::Result<SocketAddr> {
        let raw = self.bind_addr.as_deref().unwrap_or(DEFAULT_BIND_ADDR);
        raw.parse().map_err(|error| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("invalid bind address `{raw}`: {error}"),
            )
        })
    }
}

/// Runtime configuration for [`super::create_server`].
pub struct ServerConfig {
    pub(crate) bind_addr: SocketAddr,
    pub(crate) http_state: HttpState,
}

impl ServerConfig {
    /// Build the storage adapters named by `settings`.
    ///
    /// With a database URL this creates the pool once and, unless disabled,
    /// applies pending migrations before any request is served.
    pub async fn from_settings(settings: &ServerSettings) -> io::Result<Self> {
        let bind_addr = settings.bind_addr()?;
        let http_state = match settings.database_url.as_deref() {
            Some(database_url) => {
                if settings.run_migrations {
                    let applied = run_pending_migrations(database_url)
                        .await
                        .map_err(|error| io::Error::other(format!("run migrations: {error}")))?;
                    info!(applied, "database migrations applied");
                }
                let pool = DbPool::new(
                    PoolConfig::new(database_url).with_max_size(settings.pool_max_size),
                )
                .await
                .map_err(|error| io::Error::other(format!("create database pool: {error}")))?;
                HttpState::from_repositories(
                    Arc::new(DieselIdentityRepository::new(pool.clone())),
                    Arc::new(DieselAuthorizedKeyRepository::new(pool)),
                )
            }
            None => {
                warn!("no database URL configured; using the in-memory store");
                HttpState::from_store(Arc::new(InMemoryIdentityStore::new()))
            }
        };
        Ok(Self {
            bind_addr,
            http_state,
        })
    }

    /// Socket address the server will bind to.
    #[must_use]
    pub fn bind_addr(&self) -> SocketAddr {
        self.bind_addr
    }
}
