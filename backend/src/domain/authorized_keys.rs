//! Authorization edges: which users may log in as which other users.
//!
//! One [`AuthorizedKeyEntry`] is one line of the owner's
//! `~/.ssh/authorized_keys`: the authed user's key, optionally prefixed by an
//! SSH options string. The `(owner, authed_user)` pair is the natural key.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::UserId;

/// Sequence number of an entry; ascending order is insertion order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuthorizedKeyEntryId(i64);

impl AuthorizedKeyEntryId {
    /// Wrap a raw sequence value.
    #[must_use]
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    /// Raw sequence value.
    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for AuthorizedKeyEntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Validation errors for [`AuthorizedKeyOptions`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthorizedKeyOptionsError {
    #[error("options must not be empty")]
    Empty,
    #[error("options must be a single line")]
    MultiLine,
}

/// SSH options prefix for an `authorized_keys` line, e.g.
/// `from="10.0.0.0/8",no-port-forwarding`.
///
/// The text is free-form; only line structure is enforced so an entry can
/// never spill onto a second line of the rendered file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AuthorizedKeyOptions(String);

impl AuthorizedKeyOptions {
    /// Validate and construct an options string.
    pub fn new(options: impl Into<String>) -> Result<Self, AuthorizedKeyOptionsError> {
        let raw = options.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(AuthorizedKeyOptionsError::Empty);
        }
        if trimmed.contains(['\n', '\r']) {
            return Err(AuthorizedKeyOptionsError::MultiLine);
        }
        Ok(Self(trimmed.to_owned()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for AuthorizedKeyOptions {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<AuthorizedKeyOptions> for String {
    fn from(value: AuthorizedKeyOptions) -> Self {
        value.0
    }
}

impl TryFrom<String> for AuthorizedKeyOptions {
    type Error = AuthorizedKeyOptionsError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Directed edge from the owner of an `authorized_keys` file to a user
/// granted access through it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizedKeyEntry {
    pub id: AuthorizedKeyEntryId,
    pub owner: UserId,
    pub authed_user: UserId,
    pub options: Option<AuthorizedKeyOptions>,
}

impl AuthorizedKeyEntry {
    /// Whether the entry grants a user access to their own account.
    ///
    /// Such entries are permitted but redundant: a user's own key is
    /// trivially authorized.
    #[must_use]
    pub fn is_self_reference(&self) -> bool {
        self.owner == self.authed_user
    }
}
