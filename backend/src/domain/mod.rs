//! Domain primitives, services and ports for the key server.
//!
//! Purpose: model SSH key identities (Domain → Host → User) and the
//! authorization edges between users, independent of HTTP and storage.
//!
//! Public surface:
//! - `UserHostDomain` — parsed `user@host.domain` identifier.
//! - `Domain`, `Host`, `User`, `PublicKey` — identity entities.
//! - `AuthorizedKeyEntry` — one line of an owner's `authorized_keys` file.
//! - `KeyRegistryService`, `AuthorizationService` — driving port
//!   implementations.
//! - `Error`, `ErrorCode` — transport-agnostic error payload.
//! - `TraceId` — request-scoped correlation identifier.

pub mod authorization_service;
pub mod authorized_keys;
pub mod error;
pub mod identifier;
pub mod identity;
pub mod key_registry_service;
pub mod ports;
pub mod trace_id;

pub use self::authorization_service::AuthorizationService;
pub use self::authorized_keys::{
    AuthorizedKeyEntry, AuthorizedKeyEntryId, AuthorizedKeyOptions, AuthorizedKeyOptionsError,
};
pub use self::error::{Error, ErrorCode, TRACE_ID_HEADER};
pub use self::identifier::{IdentifierParseError, UserHostDomain};
pub use self::identity::{
    Domain, DomainId, Host, HostId, PublicKey, PublicKeyValidationError, User, UserId,
};
pub use self::key_registry_service::KeyRegistryService;
pub use self::trace_id::TraceId;

/// Convenient API result alias.
///
/// # Examples
/// ```
/// use keyserver::domain::{ApiResult, Error};
///
/// fn lookup() -> ApiResult<()> {
///     Err(Error::not_found("no such identity"))
/// }
/// assert!(lookup().is_err());
/// ```
pub type ApiResult<T> = Result<T, Error>;
