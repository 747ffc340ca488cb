//! PostgreSQL-backed `IdentityRepository` implementation using Diesel ORM.
//!
//! Uniqueness is enforced by the `domains.name`, `hosts (domain_id, name)`
//! and `users (host_id, name)` constraints; violations come back as
//! [`IdentityPersistenceError::Conflict`]. Deletes rely on `ON DELETE
//! CASCADE` to remove dependent rows.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use tracing::debug;
use uuid::Uuid;

use crate::domain::ports::{
    IdentityPersistenceError, IdentityRepository, NewDomain, NewHost, NewUser,
};
use crate::domain::{Domain, DomainId, Host, HostId, PublicKey, User, UserId};

use super::error_mapping::{map_diesel_error, map_pool_error};
use super::models::{DomainRow, HostRow, NewDomainRow, NewHostRow, NewUserRow, UserRow};
use super::pool::DbPool;
use super::schema::{domains, hosts, users};

/// Diesel-backed implementation of the [`IdentityRepository`] port.
#[derive(Clone)]
pub struct DieselIdentityRepository {
    pool: DbPool,
}

impl DieselIdentityRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl IdentityRepository for DieselIdentityRepository {
    async fn create_domain(&self, domain: &NewDomain) -> Result<Domain, IdentityPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = NewDomainRow {
            id: Uuid::new_v4(),
            name: &domain.name,
            comment: domain.comment.as_deref(),
        };

        diesel::insert_into(domains::table)
            .values(&row)
            .returning(DomainRow::as_returning())
            .get_result(&mut conn)
            .await
            .map(Domain::from)
            .map_err(map_diesel_error)
    }

    async fn find_domain_by_name(
        &self,
        name: &str,
    ) -> Result<Option<Domain>, IdentityPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        domains::table
            .filter(domains::name.eq(name))
            .select(DomainRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map(|row| row.map(Domain::from))
            .map_err(map_diesel_error)
    }

    async fn create_host(&self, host: &NewHost) -> Result<Host, IdentityPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = NewHostRow {
            id: Uuid::new_v4(),
            domain_id: *host.domain_id.as_uuid(),
            name: &host.name,
            comment: host.comment.as_deref(),
        };

        diesel::insert_into(hosts::table)
            .values(&row)
            .returning(HostRow::as_returning())
            .get_result(&mut conn)
            .await
            .map(Host::from)
            .map_err(map_diesel_error)
    }

    async fn find_host_by_domain_and_name(
        &self,
        domain_id: &DomainId,
        name: &str,
    ) -> Result<Option<Host>, IdentityPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        hosts::table
            .filter(hosts::domain_id.eq(domain_id.as_uuid()))
            .filter(hosts::name.eq(name))
            .select(HostRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map(|row| row.map(Host::from))
            .map_err(map_diesel_error)
    }

    async fn create_user(&self, user: &NewUser) -> Result<User, IdentityPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = NewUserRow {
            id: Uuid::new_v4(),
            host_id: *user.host_id.as_uuid(),
            name: &user.name,
            pub_key: user.pub_key.as_str(),
            comment: user.comment.as_deref(),
        };

        let created: UserRow = diesel::insert_into(users::table)
            .values(&row)
            .returning(UserRow::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        User::try_from(created)
    }

    async fn find_user_by_host_and_name(
        &self,
        host_id: &HostId,
        name: &str,
    ) -> Result<Option<User>, IdentityPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<UserRow> = users::table
            .filter(users::host_id.eq(host_id.as_uuid()))
            .filter(users::name.eq(name))
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(User::try_from).transpose()
    }

    async fn update_user_pub_key(
        &self,
        user_id: &UserId,
        pub_key: &PublicKey,
    ) -> Result<User, IdentityPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let updated: Option<UserRow> = diesel::update(users::table.filter(users::id.eq(user_id.as_uuid())))
            .set((
                users::pub_key.eq(pub_key.as_str()),
                users::updated_at.eq(diesel::dsl::now),
            ))
            .returning(UserRow::as_returning())
            .get_result(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        let row = updated
            .ok_or_else(|| IdentityPersistenceError::not_found(format!("user {user_id}")))?;
        User::try_from(row)
    }

    async fn delete_user(&self, user_id: &UserId) -> Result<bool, IdentityPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let deleted = diesel::delete(users::table.filter(users::id.eq(user_id.as_uuid())))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        debug!(%user_id, deleted, "deleted user");
        Ok(deleted > 0)
    }

    async fn delete_host(&self, host_id: &HostId) -> Result<bool, IdentityPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let deleted = diesel::delete(hosts::table.filter(hosts::id.eq(host_id.as_uuid())))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        debug!(%host_id, deleted, "deleted host");
        Ok(deleted > 0)
    }

    async fn delete_domain(&self, domain_id: &DomainId) -> Result<bool, IdentityPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let deleted = diesel::delete(domains::table.filter(domains::id.eq(domain_id.as_uuid())))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        debug!(%domain_id, deleted, "deleted domain");
        Ok(deleted > 0)
    }
}
