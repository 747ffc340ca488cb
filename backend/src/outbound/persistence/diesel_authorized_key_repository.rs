//! PostgreSQL-backed `AuthorizedKeyRepository` implementation using Diesel ORM.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use tracing::debug;

use crate::domain::ports::{
    AuthorizedKeyRepository, IdentityPersistenceError, NewAuthorizedKeyEntry,
};
use crate::domain::{AuthorizedKeyEntry, UserId};

use super::error_mapping::{map_diesel_error, map_pool_error};
use super::models::{AuthorizedKeyRow, NewAuthorizedKeyRow};
use super::pool::DbPool;
use super::schema::authorized_keys;

/// Diesel-backed implementation of the [`AuthorizedKeyRepository`] port.
///
/// The `BIGSERIAL` id orders entries by insertion.
#[derive(Clone)]
pub struct DieselAuthorizedKeyRepository {
    pool: DbPool,
}

impl DieselAuthorizedKeyRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuthorizedKeyRepository for DieselAuthorizedKeyRepository {
    async fn create_edge(
        &self,
        entry: &NewAuthorizedKeyEntry,
    ) -> Result<AuthorizedKeyEntry, IdentityPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = NewAuthorizedKeyRow {
            owner_id: *entry.owner.as_uuid(),
            authed_user_id: *entry.authed_user.as_uuid(),
            options: entry.options.as_ref().map(|options| options.as_str()),
        };

        let created: AuthorizedKeyRow = diesel::insert_into(authorized_keys::table)
            .values(&row)
            .returning(AuthorizedKeyRow::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        AuthorizedKeyEntry::try_from(created)
    }

    async fn delete_edge(
        &self,
        owner: &UserId,
        authed_user: &UserId,
    ) -> Result<bool, IdentityPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let deleted = diesel::delete(
            authorized_keys::table
                .filter(authorized_keys::owner_id.eq(owner.as_uuid()))
                .filter(authorized_keys::authed_user_id.eq(authed_user.as_uuid())),
        )
        .execute(&mut conn)
        .await
        .map_err(map_diesel_error)?;
        debug!(%owner, %authed_user, deleted, "deleted authorized key entry");
        Ok(deleted > 0)
    }

    async fn list_by_owner(
        &self,
        owner: &UserId,
    ) -> Result<Vec<AuthorizedKeyEntry>, IdentityPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows: Vec<AuthorizedKeyRow> = authorized_keys::table
            .filter(authorized_keys::owner_id.eq(owner.as_uuid()))
            .order(authorized_keys::id.asc())
            .select(AuthorizedKeyRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        rows.into_iter().map(AuthorizedKeyEntry::try_from).collect()
    }
}
