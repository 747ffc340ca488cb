//! Driving port for reading authorization edges.

use async_trait::async_trait;

use crate::domain::{AuthorizedKeyEntry, UserId};

use super::AuthError;

/// Read-side access to the authorization graph.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AuthorizedKeysQuery: Send + Sync {
    /// Edges owned by `owner` in insertion order, i.e. the lines of the
    /// owner's `authorized_keys` file.
    async fn list_authorized(&self, owner: &UserId) -> Result<Vec<AuthorizedKeyEntry>, AuthError>;
}
