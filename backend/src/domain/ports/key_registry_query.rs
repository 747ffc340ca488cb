//! Driving port for key lookups.

use async_trait::async_trait;

use crate::domain::User;

use super::RegistryError;

/// Read-side access to registered identities.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait KeyRegistryQuery: Send + Sync {
    /// Resolve `identifier` through scoped lookups and return its user.
    ///
    /// # Errors
    ///
    /// [`RegistryError::UnknownIdentity`] when the domain, host or user is
    /// missing; [`RegistryError::InvalidIdentifier`] for malformed input.
    async fn fetch_key(&self, identifier: &str) -> Result<User, RegistryError>;
}
