//! Identity entities: domains, hosts and the users that hold SSH keys.
//!
//! Ownership runs Domain → Host → User. Names are unique per parent only:
//! a domain name is global, a host name is unique within its domain and a
//! user name is unique within its host. Lookups therefore always carry the
//! parent identifier.

use std::fmt;

use base64::Engine as _;
use base64::engine::general_purpose::{STANDARD, STANDARD_NO_PAD};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Generate a new random identifier.
            #[must_use]
            pub fn random() -> Self {
                Self(Uuid::new_v4())
            }

            /// Wrap an existing UUID.
            #[must_use]
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Access the underlying UUID.
            #[must_use]
            pub const fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.0, f)
            }
        }
    };
}

uuid_id! {
    /// Stable identifier of a [`Domain`].
    DomainId
}

uuid_id! {
    /// Stable identifier of a [`Host`].
    HostId
}

uuid_id! {
    /// Stable identifier of a [`User`].
    UserId
}

/// Validation errors for [`PublicKey`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PublicKeyValidationError {
    #[error("public key must not be empty")]
    Empty,
    #[error("public key must be a single line")]
    MultiLine,
}

/// SSH public key text as stored for a user.
///
/// The text is kept verbatim apart from surrounding whitespace. OpenSSH
/// formatted keys (`<type> <base64> [comment]`) additionally expose a
/// fingerprint; other opaque key material is accepted but has none.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PublicKey(String);

impl PublicKey {
    /// Validate and construct a key.
    pub fn new(key: impl Into<String>) -> Result<Self, PublicKeyValidationError> {
        let raw = key.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(PublicKeyValidationError::Empty);
        }
        if trimmed.contains(['\n', '\r']) {
            return Err(PublicKeyValidationError::MultiLine);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Key text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Key algorithm, e.g. `ssh-ed25519`, when the key is OpenSSH formatted.
    #[must_use]
    pub fn key_type(&self) -> Option<&str> {
        self.openssh_parts().map(|(key_type, _)| key_type)
    }

    /// OpenSSH style fingerprint, `SHA256:<unpadded base64>`.
    ///
    /// # Examples
    /// ```
    /// use keyserver::domain::PublicKey;
    ///
    /// let key = PublicKey::new("ssh-ed25519 AAAAC3NzaC1lZDI1NTE5AAAAIA== alice").unwrap();
    /// assert!(key.fingerprint().unwrap().starts_with("SHA256:"));
    /// assert!(PublicKey::new("opaque").unwrap().fingerprint().is_none());
    /// ```
    #[must_use]
    pub fn fingerprint(&self) -> Option<String> {
        let (_, blob) = self.openssh_parts()?;
        let decoded = STANDARD.decode(blob).ok()?;
        let digest = Sha256::digest(&decoded);
        Some(format!("SHA256:{}", STANDARD_NO_PAD.encode(digest)))
    }

    fn openssh_parts(&self) -> Option<(&str, &str)> {
        let mut fields = self.0.split_whitespace();
        let key_type = fields.next()?;
        let blob = fields.next()?;
        let looks_like_type = key_type.starts_with("ssh-")
            || key_type.starts_with("ecdsa-")
            || key_type.starts_with("sk-");
        looks_like_type.then_some((key_type, blob))
    }
}

impl AsRef<str> for PublicKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<PublicKey> for String {
    fn from(value: PublicKey) -> Self {
        value.0
    }
}

impl TryFrom<String> for PublicKey {
    type Error = PublicKeyValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// DNS domain grouping hosts. Names are globally unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Domain {
    pub id: DomainId,
    pub name: String,
    pub comment: Option<String>,
}

/// Host within a [`Domain`]. Names are unique per domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Host {
    pub id: HostId,
    pub domain_id: DomainId,
    pub name: String,
    pub comment: Option<String>,
}

impl Host {
    /// Fully qualified host name within `domain`.
    #[must_use]
    pub fn fqn(&self, domain: &Domain) -> String {
        format!("{}.{}", self.name, domain.name)
    }
}

/// User account on a [`Host`] holding one public key. Names are unique per host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub host_id: HostId,
    pub name: String,
    pub pub_key: PublicKey,
    pub comment: Option<String>,
}
