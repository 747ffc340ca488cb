//! Key registry domain service.
//!
//! Implements the key registry driving ports. Registration walks the
//! Domain → Host → User hierarchy with "try create, fetch on conflict" at
//! every level, so concurrent registrations of the same identity serialise
//! on the store's uniqueness constraints rather than on an in-process lock.
//! Domains and hosts created before a later step fails stay in place.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::domain::ports::{
    IdentityPersistenceError, IdentityRepository, KeyRegistryCommand, KeyRegistryQuery,
    NewDomain, NewHost, NewUser, RegisterKeyRequest, RegisteredKey, RegistrationOutcome,
    RegistryError,
};
use crate::domain::{Domain, Host, User, UserHostDomain};

/// Registry service implementing [`KeyRegistryCommand`] and
/// [`KeyRegistryQuery`] over an [`IdentityRepository`].
#[derive(Clone)]
pub struct KeyRegistryService<R> {
    identities: Arc<R>,
}

impl<R> KeyRegistryService<R> {
    /// Create a new service backed by `identities`.
    pub fn new(identities: Arc<R>) -> Self {
        Self { identities }
    }
}

fn storage(error: IdentityPersistenceError) -> RegistryError {
    RegistryError::StorageFailure(error)
}

/// A conflict said the row exists but the scoped fetch found nothing: it
/// was deleted in between.
fn vanished(kind: &str, name: &str) -> RegistryError {
    storage(IdentityPersistenceError::query(format!(
        "{kind} `{name}` reported as existing but could not be fetched"
    )))
}

impl<R> KeyRegistryService<R>
where
    R: IdentityRepository,
{
    /// Register `request.public_key` for `request.identifier`.
    ///
    /// See [`KeyRegistryCommand::register_key`] for the error contract.
    pub async fn add_user_and_key(
        &self,
        request: RegisterKeyRequest,
    ) -> Result<RegisteredKey, RegistryError> {
        let uhd = UserHostDomain::parse(&request.identifier)?;
        let domain = self.resolve_domain(uhd.domain()).await?;
        let host = self.resolve_host(&domain, uhd.host()).await?;
        self.resolve_user(&uhd, &host, request).await
    }

    async fn resolve_domain(&self, name: &str) -> Result<Domain, RegistryError> {
        let new_domain = NewDomain {
            name: name.to_owned(),
            comment: None,
        };
        match self.identities.create_domain(&new_domain).await {
            Ok(domain) => {
                debug!(domain = %domain.name, "created domain");
                Ok(domain)
            }
            Err(IdentityPersistenceError::Conflict { .. }) => {
                debug!(domain = name, "domain exists, fetching");
                self.identities
                    .find_domain_by_name(name)
                    .await
                    .map_err(storage)?
                    .ok_or_else(|| vanished("domain", name))
            }
            Err(error) => Err(storage(error)),
        }
    }

    async fn resolve_host(&self, domain: &Domain, name: &str) -> Result<Host, RegistryError> {
        let new_host = NewHost {
            domain_id: domain.id,
            name: name.to_owned(),
            comment: None,
        };
        match self.identities.create_host(&new_host).await {
            Ok(host) => {
                debug!(host = %host.fqn(domain), "created host");
                Ok(host)
            }
            Err(IdentityPersistenceError::Conflict { .. }) => {
                debug!(host = name, domain = %domain.name, "host exists, fetching");
                self.identities
                    .find_host_by_domain_and_name(&domain.id, name)
                    .await
                    .map_err(storage)?
                    .ok_or_else(|| vanished("host", name))
            }
            Err(error) => Err(storage(error)),
        }
    }

    async fn resolve_user(
        &self,
        uhd: &UserHostDomain,
        host: &Host,
        request: RegisterKeyRequest,
    ) -> Result<RegisteredKey, RegistryError> {
        let RegisterKeyRequest {
            public_key,
            comment,
            allow_update,
            ..
        } = request;
        let new_user = NewUser {
            host_id: host.id,
            name: uhd.user().to_owned(),
            pub_key: public_key,
            comment,
        };
        match self.identities.create_user(&new_user).await {
            Ok(user) => {
                info!(identifier = %uhd, user_id = %user.id, "registered new user key");
                Ok(RegisteredKey {
                    user,
                    outcome: RegistrationOutcome::Created,
                })
            }
            Err(IdentityPersistenceError::Conflict { .. }) if !allow_update => {
                debug!(identifier = %uhd, "user exists and update not allowed");
                Err(RegistryError::UserExists {
                    identifier: uhd.to_string(),
                })
            }
            Err(IdentityPersistenceError::Conflict { .. }) => {
                let existing = self
                    .identities
                    .find_user_by_host_and_name(&host.id, uhd.user())
                    .await
                    .map_err(storage)?
                    .ok_or_else(|| vanished("user", uhd.user()))?;
                let user = self
                    .identities
                    .update_user_pub_key(&existing.id, &new_user.pub_key)
                    .await
                    .map_err(storage)?;
                info!(identifier = %uhd, user_id = %user.id, "replaced user key");
                Ok(RegisteredKey {
                    user,
                    outcome: RegistrationOutcome::Updated,
                })
            }
            Err(error) => Err(storage(error)),
        }
    }

    async fn lookup(&self, identifier: &str) -> Result<User, RegistryError> {
        let uhd = UserHostDomain::parse(identifier)?;
        let unknown = || RegistryError::UnknownIdentity {
            identifier: uhd.to_string(),
        };

        let Some(domain) = self
            .identities
            .find_domain_by_name(uhd.domain())
            .await
            .map_err(storage)?
        else {
            return Err(unknown());
        };
        let Some(host) = self
            .identities
            .find_host_by_domain_and_name(&domain.id, uhd.host())
            .await
            .map_err(storage)?
        else {
            return Err(unknown());
        };
        self.identities
            .find_user_by_host_and_name(&host.id, uhd.user())
            .await
            .map_err(storage)?
            .ok_or_else(unknown)
    }
}

#[async_trait]
impl<R> KeyRegistryCommand for KeyRegistryService<R>
where
    R: IdentityRepository,
{
    async fn register_key(
        &self,
        request: RegisterKeyRequest,
    ) -> Result<RegisteredKey, RegistryError> {
        self.add_user_and_key(request).await
    }

    async fn remove_user(&self, identifier: &str) -> Result<(), RegistryError> {
        let user = self.lookup(identifier).await?;
        let removed = self
            .identities
            .delete_user(&user.id)
            .await
            .map_err(storage)?;
        if !removed {
            return Err(RegistryError::UnknownIdentity {
                identifier: identifier.trim().to_owned(),
            });
        }
        info!(identifier = identifier.trim(), user_id = %user.id, "removed user");
        Ok(())
    }
}

#[async_trait]
impl<R> KeyRegistryQuery for KeyRegistryService<R>
where
    R: IdentityRepository,
{
    async fn fetch_key(&self, identifier: &str) -> Result<User, RegistryError> {
        self.lookup(identifier).await
    }
}

#[cfg(test)]
#[path = "key_registry_service_tests.rs"]
mod tests;
