//! Driven port for Domain → Host → User storage.
//!
//! Adapters must enforce the three uniqueness constraints (domain name,
//! host name per domain, user name per host) atomically and report a
//! violation as [`IdentityPersistenceError::Conflict`], distinct from every
//! other failure. The registry relies on that signal to turn a racing
//! create into a fetch.

use async_trait::async_trait;

use crate::domain::{Domain, DomainId, Error, Host, HostId, PublicKey, User, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by identity and authorized-key storage adapters.
    pub enum IdentityPersistenceError {
        /// Storage could not be reached.
        Connection { message: String } => "identity store connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "identity store query failed: {message}",
        /// A uniqueness constraint rejected the write.
        Conflict { message: String } => "identity store uniqueness conflict: {message}",
        /// A referenced row does not exist.
        MissingReference { message: String } => "identity store missing reference: {message}",
        /// The row addressed by an update does not exist.
        NotFound { message: String } => "identity store record not found: {message}",
    }
}

impl From<IdentityPersistenceError> for Error {
    fn from(value: IdentityPersistenceError) -> Self {
        match value {
            IdentityPersistenceError::Connection { message } => {
                Error::service_unavailable(format!("identity store unavailable: {message}"))
            }
            other => Error::internal(other.to_string()),
        }
    }
}

/// Values for a new [`Domain`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDomain {
    pub name: String,
    pub comment: Option<String>,
}

/// Values for a new [`Host`] under an existing domain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewHost {
    pub domain_id: DomainId,
    pub name: String,
    pub comment: Option<String>,
}

/// Values for a new [`User`] under an existing host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub host_id: HostId,
    pub name: String,
    pub pub_key: PublicKey,
    pub comment: Option<String>,
}

/// Storage for the identity hierarchy.
///
/// Every child lookup takes the parent identifier: host and user names are
/// only unique within their parent, so a name-only lookup could resolve a
/// row that belongs elsewhere.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdentityRepository: Send + Sync {
    /// Insert a domain; `Conflict` when the name is taken.
    async fn create_domain(&self, domain: &NewDomain) -> Result<Domain, IdentityPersistenceError>;

    /// Fetch a domain by its globally unique name.
    async fn find_domain_by_name(
        &self,
        name: &str,
    ) -> Result<Option<Domain>, IdentityPersistenceError>;

    /// Insert a host; `Conflict` when the name is taken within the domain.
    async fn create_host(&self, host: &NewHost) -> Result<Host, IdentityPersistenceError>;

    /// Fetch a host by name within one domain.
    async fn find_host_by_domain_and_name(
        &self,
        domain_id: &DomainId,
        name: &str,
    ) -> Result<Option<Host>, IdentityPersistenceError>;

    /// Insert a user; `Conflict` when the name is taken on the host.
    async fn create_user(&self, user: &NewUser) -> Result<User, IdentityPersistenceError>;

    /// Fetch a user by name on one host.
    async fn find_user_by_host_and_name(
        &self,
        host_id: &HostId,
        name: &str,
    ) -> Result<Option<User>, IdentityPersistenceError>;

    /// Replace a user's public key, returning the updated record.
    async fn update_user_pub_key(
        &self,
        user_id: &UserId,
        pub_key: &PublicKey,
    ) -> Result<User, IdentityPersistenceError>;

    /// Delete a user and every authorized-key entry that references it.
    ///
    /// Returns whether a row was removed.
    async fn delete_user(&self, user_id: &UserId) -> Result<bool, IdentityPersistenceError>;

    /// Delete a host together with its users and their entries.
    async fn delete_host(&self, host_id: &HostId) -> Result<bool, IdentityPersistenceError>;

    /// Delete a domain together with its hosts, users and entries.
    async fn delete_domain(&self, domain_id: &DomainId) -> Result<bool, IdentityPersistenceError>;
}
