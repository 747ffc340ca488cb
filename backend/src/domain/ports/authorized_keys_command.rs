//! Driving port for granting and revoking access between users.

use async_trait::async_trait;
use serde_json::json;

use crate::domain::{AuthorizedKeyEntry, AuthorizedKeyOptions, Error, UserId};

use super::IdentityPersistenceError;

/// Request to let `authed_user` log in as `owner`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizeRequest {
    pub owner: UserId,
    pub authed_user: UserId,
    pub options: Option<AuthorizedKeyOptions>,
}

/// Failures reported by the authorization graph.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("{authed_user} is already authorized for {owner}")]
    DuplicateEdge { owner: UserId, authed_user: UserId },
    #[error("owner {owner} or authorized user {authed_user} does not exist")]
    UnknownUser { owner: UserId, authed_user: UserId },
    #[error("authorized key storage failed: {0}")]
    StorageFailure(#[source] IdentityPersistenceError),
}

impl From<AuthError> for Error {
    fn from(value: AuthError) -> Self {
        match value {
            AuthError::DuplicateEdge { owner, authed_user } => {
                Error::conflict("user is already authorized").with_details(json!({
                    "code": "duplicate_edge",
                    "owner": owner,
                    "authedUser": authed_user,
                }))
            }
            AuthError::UnknownUser { owner, authed_user } => {
                Error::not_found("owner or authorized user does not exist").with_details(json!({
                    "code": "unknown_user",
                    "owner": owner,
                    "authedUser": authed_user,
                }))
            }
            AuthError::StorageFailure(cause) => cause.into(),
        }
    }
}

/// Driving port for authorization edges.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AuthorizedKeysCommand: Send + Sync {
    /// Create the edge; a second call for the same pair is
    /// [`AuthError::DuplicateEdge`].
    async fn authorize(&self, request: AuthorizeRequest) -> Result<AuthorizedKeyEntry, AuthError>;

    /// Remove the edge if present. Revoking a missing edge succeeds.
    async fn revoke(&self, owner: &UserId, authed_user: &UserId) -> Result<(), AuthError>;
}
