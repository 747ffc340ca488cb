//! PostgreSQL persistence adapters using Diesel ORM.
//!
//! Repositories are thin translators between Diesel rows and domain
//! entities, sharing one `bb8` pool via `diesel-async`. Row structs and
//! table definitions stay private to this module.
//!
//! # Example
//!
//! ```ignore
//! use keyserver::outbound::persistence::{DbPool, DieselIdentityRepository, PoolConfig};
//!
//! let pool = DbPool::new(PoolConfig::new("postgres://localhost/keys")).await?;
//! let identities = DieselIdentityRepository::new(pool.clone());
//! ```

mod diesel_authorized_key_repository;
mod diesel_identity_repository;
mod error_mapping;
mod migrations;
mod models;
mod pool;
mod schema;

pub use diesel_authorized_key_repository::DieselAuthorizedKeyRepository;
pub use diesel_identity_repository::DieselIdentityRepository;
pub use migrations::{MigrationError, run_pending_migrations};
pub use pool::{DbPool, PoolConfig, PoolError};
