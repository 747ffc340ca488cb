//! Driving port for registering and removing SSH keys.
//!
//! The [`KeyRegistryCommand`] trait is the only way identities enter the
//! store: HTTP handlers and the `register-key` CLI call it, and the
//! implementation resolves Domain → Host → User with create-or-fetch
//! semantics at each level.

use async_trait::async_trait;
use serde_json::json;

use crate::domain::{Error, IdentifierParseError, PublicKey, User};

use super::IdentityPersistenceError;

/// Request to register a key for a `user@host.domain` identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterKeyRequest {
    /// Raw identifier; parsed by the registry.
    pub identifier: String,
    /// Key to store for the user.
    pub public_key: PublicKey,
    /// Comment stored on a newly created user.
    pub comment: Option<String>,
    /// Overwrite the key when the user already exists.
    pub allow_update: bool,
}

impl RegisterKeyRequest {
    /// Build a create-only request without a comment.
    pub fn new(identifier: impl Into<String>, public_key: PublicKey) -> Self {
        Self {
            identifier: identifier.into(),
            public_key,
            comment: None,
            allow_update: false,
        }
    }

    /// Attach a comment for the user record.
    #[must_use]
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// Permit replacing the key of an existing user.
    #[must_use]
    pub fn with_allow_update(mut self, allow_update: bool) -> Self {
        self.allow_update = allow_update;
        self
    }
}

/// Whether a registration created a user or replaced an existing key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationOutcome {
    Created,
    Updated,
}

/// Result of a successful registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisteredKey {
    pub user: User,
    pub outcome: RegistrationOutcome,
}

/// Failures reported by the key registry.
///
/// Uniqueness conflicts on domains and hosts never surface here; they are
/// resolved into fetches. A user conflict surfaces only as
/// [`RegistryError::UserExists`] when updates are not allowed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error(transparent)]
    InvalidIdentifier(#[from] IdentifierParseError),
    #[error("user {identifier} already exists")]
    UserExists { identifier: String },
    #[error("no identity registered for {identifier}")]
    UnknownIdentity { identifier: String },
    #[error("identity storage failed: {0}")]
    StorageFailure(#[source] IdentityPersistenceError),
}

impl From<RegistryError> for Error {
    fn from(value: RegistryError) -> Self {
        match value {
            RegistryError::InvalidIdentifier(IdentifierParseError::Malformed { identifier }) => {
                Error::invalid_request("identifier must be of the form user@host.domain")
                    .with_details(json!({
                        "code": "invalid_identifier",
                        "identifier": identifier,
                    }))
            }
            RegistryError::UserExists { identifier } => {
                Error::conflict(format!("user {identifier} already exists")).with_details(json!({
                    "code": "user_exists",
                    "identifier": identifier,
                }))
            }
            RegistryError::UnknownIdentity { identifier } => {
                Error::not_found(format!("no identity registered for {identifier}")).with_details(
                    json!({
                        "code": "unknown_identity",
                        "identifier": identifier,
                    }),
                )
            }
            RegistryError::StorageFailure(cause) => cause.into(),
        }
    }
}

/// Driving port for key registration.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait KeyRegistryCommand: Send + Sync {
    /// Create-or-fetch the domain and host, then create the user or, when
    /// allowed, replace its key.
    ///
    /// # Errors
    ///
    /// - [`RegistryError::InvalidIdentifier`] for a malformed identifier.
    /// - [`RegistryError::UserExists`] when the user exists and
    ///   `allow_update` is false.
    /// - [`RegistryError::StorageFailure`] for any other storage error.
    async fn register_key(
        &self,
        request: RegisterKeyRequest,
    ) -> Result<RegisteredKey, RegistryError>;

    /// Delete the user named by `identifier` and its authorization edges.
    ///
    /// The user's host and domain are left in place.
    async fn remove_user(&self, identifier: &str) -> Result<(), RegistryError>;
}
