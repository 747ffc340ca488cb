//! Domain ports and supporting types for the hexagonal boundary.
//!
//! Driven ports ([`IdentityRepository`], [`AuthorizedKeyRepository`]) are
//! implemented by outbound storage adapters. Driving ports
//! ([`KeyRegistryCommand`], [`KeyRegistryQuery`], [`AuthorizedKeysCommand`],
//! [`AuthorizedKeysQuery`]) are implemented by domain services and consumed
//! by inbound adapters.

mod macros;
pub(crate) use macros::define_port_error;

mod authorized_key_repository;
mod authorized_keys_command;
mod authorized_keys_query;
mod identity_repository;
mod key_registry_command;
mod key_registry_query;

#[cfg(test)]
pub use authorized_key_repository::MockAuthorizedKeyRepository;
pub use authorized_key_repository::{AuthorizedKeyRepository, NewAuthorizedKeyEntry};
#[cfg(test)]
pub use authorized_keys_command::MockAuthorizedKeysCommand;
pub use authorized_keys_command::{AuthError, AuthorizeRequest, AuthorizedKeysCommand};
#[cfg(test)]
pub use authorized_keys_query::MockAuthorizedKeysQuery;
pub use authorized_keys_query::AuthorizedKeysQuery;
#[cfg(test)]
pub use identity_repository::MockIdentityRepository;
pub use identity_repository::{
    IdentityPersistenceError, IdentityRepository, NewDomain, NewHost, NewUser,
};
#[cfg(test)]
pub use key_registry_command::MockKeyRegistryCommand;
pub use key_registry_command::{
    KeyRegistryCommand, RegisterKeyRequest, RegisteredKey, RegistrationOutcome, RegistryError,
};
#[cfg(test)]
pub use key_registry_query::MockKeyRegistryQuery;
pub use key_registry_query::KeyRegistryQuery;
