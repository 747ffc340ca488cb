//! Driven port for authorization edges between users.

use async_trait::async_trait;

use crate::domain::{AuthorizedKeyEntry, AuthorizedKeyOptions, UserId};

use super::IdentityPersistenceError;

/// Values for a new [`AuthorizedKeyEntry`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAuthorizedKeyEntry {
    pub owner: UserId,
    pub authed_user: UserId,
    pub options: Option<AuthorizedKeyOptions>,
}

/// Storage for `authorized_keys` entries.
///
/// The `(owner, authed_user)` pair is unique; a second insert for the same
/// pair fails with [`IdentityPersistenceError::Conflict`]. Inserting an edge
/// that references a missing user fails with
/// [`IdentityPersistenceError::MissingReference`].
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AuthorizedKeyRepository: Send + Sync {
    /// Insert an edge.
    async fn create_edge(
        &self,
        entry: &NewAuthorizedKeyEntry,
    ) -> Result<AuthorizedKeyEntry, IdentityPersistenceError>;

    /// Remove the edge for the pair, returning whether one existed.
    async fn delete_edge(
        &self,
        owner: &UserId,
        authed_user: &UserId,
    ) -> Result<bool, IdentityPersistenceError>;

    /// All edges owned by `owner`, in insertion order.
    async fn list_by_owner(
        &self,
        owner: &UserId,
    ) -> Result<Vec<AuthorizedKeyEntry>, IdentityPersistenceError>;
}
