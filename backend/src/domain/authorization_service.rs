//! Authorization graph service.
//!
//! Edges are keyed by `(owner, authed_user)`. Creation relies on the store's
//! uniqueness constraint to detect duplicates; revocation is idempotent.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::domain::AuthorizedKeyEntry;
use crate::domain::UserId;
use crate::domain::ports::{
    AuthError, AuthorizeRequest, AuthorizedKeyRepository, AuthorizedKeysCommand,
    AuthorizedKeysQuery, IdentityPersistenceError, NewAuthorizedKeyEntry,
};

/// Service implementing [`AuthorizedKeysCommand`] and
/// [`AuthorizedKeysQuery`].
#[derive(Clone)]
pub struct AuthorizationService<A> {
    edges: Arc<A>,
}

impl<A> AuthorizationService<A> {
    /// Create a new service backed by `edges`.
    pub fn new(edges: Arc<A>) -> Self {
        Self { edges }
    }
}

#[async_trait]
impl<A> AuthorizedKeysCommand for AuthorizationService<A>
where
    A: AuthorizedKeyRepository,
{
    async fn authorize(&self, request: AuthorizeRequest) -> Result<AuthorizedKeyEntry, AuthError> {
        let AuthorizeRequest {
            owner,
            authed_user,
            options,
        } = request;
        let entry = NewAuthorizedKeyEntry {
            owner,
            authed_user,
            options,
        };

        let created = self
            .edges
            .create_edge(&entry)
            .await
            .map_err(|error| match error {
                IdentityPersistenceError::Conflict { .. } => {
                    AuthError::DuplicateEdge { owner, authed_user }
                }
                IdentityPersistenceError::MissingReference { .. } => {
                    AuthError::UnknownUser { owner, authed_user }
                }
                other => AuthError::StorageFailure(other),
            })?;

        if created.is_self_reference() {
            warn!(
                user_id = %owner,
                entry_id = %created.id,
                "authorized a user for their own account; entry has no effect"
            );
        } else {
            info!(
                owner = %owner,
                authed_user = %authed_user,
                entry_id = %created.id,
                "authorized user"
            );
        }
        Ok(created)
    }

    async fn revoke(&self, owner: &UserId, authed_user: &UserId) -> Result<(), AuthError> {
        let removed = self
            .edges
            .delete_edge(owner, authed_user)
            .await
            .map_err(AuthError::StorageFailure)?;
        if removed {
            info!(owner = %owner, authed_user = %authed_user, "revoked user");
        } else {
            debug!(owner = %owner, authed_user = %authed_user, "no edge to revoke");
        }
        Ok(())
    }
}

#[async_trait]
impl<A> AuthorizedKeysQuery for AuthorizationService<A>
where
    A: AuthorizedKeyRepository,
{
    async fn list_authorized(&self, owner: &UserId) -> Result<Vec<AuthorizedKeyEntry>, AuthError> {
        self.edges
            .list_by_owner(owner)
            .await
            .map_err(AuthError::StorageFailure)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::MockAuthorizedKeyRepository;
    use crate::domain::{AuthorizedKeyEntryId, AuthorizedKeyOptions};
    use rstest::rstest;

    fn make_service(
        repo: MockAuthorizedKeyRepository,
    ) -> AuthorizationService<MockAuthorizedKeyRepository> {
        AuthorizationService::new(Arc::new(repo))
    }

    fn request(owner: UserId, authed_user: UserId) -> AuthorizeRequest {
        AuthorizeRequest {
            owner,
            authed_user,
            options: None,
        }
    }

    #[rstest]
    #[tokio::test]
    async fn authorize_creates_edge_with_options() {
        let owner = UserId::random();
        let authed_user = UserId::random();
        let options = AuthorizedKeyOptions::new("no-pty").expect("valid options");
        let expected_options = options.clone();
        let mut repo = MockAuthorizedKeyRepository::new();
        repo.expect_create_edge()
            .withf(move |entry| {
                entry.owner == owner
                    && entry.authed_user == authed_user
                    && entry.options.as_ref() == Some(&expected_options)
            })
            .times(1)
            .return_once(|entry| {
                Ok(AuthorizedKeyEntry {
                    id: AuthorizedKeyEntryId::new(7),
                    owner: entry.owner,
                    authed_user: entry.authed_user,
                    options: entry.options.clone(),
                })
            });

        let created = make_service(repo)
            .authorize(AuthorizeRequest {
                owner,
                authed_user,
                options: Some(options),
            })
            .await
            .expect("edge created");

        assert_eq!(created.id.get(), 7);
        assert!(!created.is_self_reference());
    }

    #[rstest]
    #[case(
        IdentityPersistenceError::conflict("authorized_keys_owner_id_authed_user_id_key"),
        "duplicate"
    )]
    #[case(IdentityPersistenceError::missing_reference("users"), "unknown")]
    #[case(IdentityPersistenceError::connection("refused"), "storage")]
    #[tokio::test]
    async fn authorize_classifies_storage_errors(
        #[case] storage_error: IdentityPersistenceError,
        #[case] expected: &str,
    ) {
        let owner = UserId::random();
        let authed_user = UserId::random();
        let mut repo = MockAuthorizedKeyRepository::new();
        repo.expect_create_edge()
            .times(1)
            .return_once(move |_| Err(storage_error));

        let error = make_service(repo)
            .authorize(request(owner, authed_user))
            .await
            .expect_err("authorize fails");

        let kind = match error {
            AuthError::DuplicateEdge { .. } => "duplicate",
            AuthError::UnknownUser { .. } => "unknown",
            AuthError::StorageFailure(_) => "storage",
        };
        assert_eq!(kind, expected);
    }

    #[rstest]
    #[tokio::test]
    async fn self_reference_is_accepted() {
        let user = UserId::random();
        let mut repo = MockAuthorizedKeyRepository::new();
        repo.expect_create_edge().times(1).return_once(|entry| {
            Ok(AuthorizedKeyEntry {
                id: AuthorizedKeyEntryId::new(1),
                owner: entry.owner,
                authed_user: entry.authed_user,
                options: None,
            })
        });

        let created = make_service(repo)
            .authorize(request(user, user))
            .await
            .expect("self reference allowed");

        assert!(created.is_self_reference());
    }

    #[rstest]
    #[case(true)]
    #[case(false)]
    #[tokio::test]
    async fn revoke_is_idempotent(#[case] existed: bool) {
        let mut repo = MockAuthorizedKeyRepository::new();
        repo.expect_delete_edge()
            .times(1)
            .return_once(move |_, _| Ok(existed));

        make_service(repo)
            .revoke(&UserId::random(), &UserId::random())
            .await
            .expect("revoke succeeds");
    }

    #[rstest]
    #[tokio::test]
    async fn list_authorized_passes_through_order() {
        let owner = UserId::random();
        let entries: Vec<_> = (1..=3)
            .map(|id| AuthorizedKeyEntry {
                id: AuthorizedKeyEntryId::new(id),
                owner,
                authed_user: UserId::random(),
                options: None,
            })
            .collect();
        let expected = entries.clone();
        let mut repo = MockAuthorizedKeyRepository::new();
        repo.expect_list_by_owner()
            .withf(move |id| *id == owner)
            .times(1)
            .return_once(move |_| Ok(entries));

        let listed = make_service(repo)
            .list_authorized(&owner)
            .await
            .expect("list succeeds");

        assert_eq!(listed, expected);
    }
}
