//! Shared helpers for the Diesel adapter integration suites.
//!
//! Integration tests compile as separate crates, so each suite includes this
//! module with `mod support;` and may leave some helpers unused.
#![allow(dead_code)]

pub mod cluster_skip;
pub mod embedded_postgres;

use keyserver::domain::PublicKey;
use keyserver::outbound::persistence::{
    DbPool, DieselAuthorizedKeyRepository, DieselIdentityRepository, PoolConfig,
};
use pg_embedded_setup_unpriv::TemporaryDatabase;
use postgres::{Client, NoTls};
use tokio::runtime::Runtime;

pub use cluster_skip::handle_cluster_setup_failure;
use embedded_postgres::{provision_template_database, shared_cluster};

/// Render a PostgreSQL error with its SQLSTATE and detail.
pub fn format_postgres_error(error: &postgres::Error) -> String {
    let Some(db_error) = error.as_db_error() else {
        return error.to_string();
    };

    let mut summary = format!(
        "postgres error {:?}: {}",
        db_error.code(),
        db_error.message()
    );
    if let Some(detail) = db_error.detail() {
        summary.push_str("; detail: ");
        summary.push_str(detail);
    }
    summary
}

/// Repositories over a freshly cloned database.
pub struct DieselContext {
    /// Multi-threaded runtime reused for every async call in one test.
    pub runtime: Runtime,
    pub identities: DieselIdentityRepository,
    pub edges: DieselAuthorizedKeyRepository,
    pub database_url: String,
    _database: TemporaryDatabase,
}

/// Row counts per table, read outside the pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowCounts {
    pub domains: i64,
    pub hosts: i64,
    pub users: i64,
    pub authorized_keys: i64,
}

impl DieselContext {
    pub fn row_counts(&self) -> RowCounts {
        let mut client = Client::connect(self.database_url.as_str(), NoTls)
            .unwrap_or_else(|err| panic!("connect: {}", format_postgres_error(&err)));
        let mut count = |table: &str| -> i64 {
            client
                .query_one(format!("SELECT count(*) FROM {table}").as_str(), &[])
                .unwrap_or_else(|err| panic!("count {table}: {}", format_postgres_error(&err)))
                .get(0)
        };
        RowCounts {
            domains: count("domains"),
            hosts: count("hosts"),
            users: count("users"),
            authorized_keys: count("authorized_keys"),
        }
    }
}

fn setup_diesel_context() -> Result<DieselContext, String> {
    let runtime = Runtime::new().map_err(|err| err.to_string())?;
    let cluster = shared_cluster()?;
    let database =
        provision_template_database(cluster, &runtime).map_err(|err| err.to_string())?;
    let database_url = database.url().to_string();

    let config = PoolConfig::new(database_url.as_str()).with_max_size(4);
    let pool = runtime
        .block_on(async { DbPool::new(config).await })
        .map_err(|err| err.to_string())?;

    Ok(DieselContext {
        runtime,
        identities: DieselIdentityRepository::new(pool.clone()),
        edges: DieselAuthorizedKeyRepository::new(pool),
        database_url,
        _database: database,
    })
}

/// Context for one test, or `None` when the cluster is unavailable and
/// skipping is allowed.
pub fn diesel_context() -> Option<DieselContext> {
    match setup_diesel_context() {
        Ok(ctx) => Some(ctx),
        Err(reason) => handle_cluster_setup_failure(reason),
    }
}

pub fn key(text: &str) -> PublicKey {
    PublicKey::new(text).expect("valid key")
}
