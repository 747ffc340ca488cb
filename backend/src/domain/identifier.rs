//! `user@host.domain` identifiers.
//!
//! An identifier names one SSH user account: the part before `@` is the
//! user, the label up to the first dot after `@` is the host, and everything
//! after that dot is the domain (which may itself contain dots).

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;

/// Failure to parse a `user@host.domain` identifier.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdentifierParseError {
    /// No `@`, no dot after the `@`, or an empty component.
    #[error("identifier `{identifier}` is not of the form user@host.domain")]
    Malformed { identifier: String },
}

static UHD_RE: OnceLock<Regex> = OnceLock::new();

fn uhd_regex() -> &'static Regex {
    UHD_RE.get_or_init(|| {
        Regex::new(r"^([^@]+)@([^.]+)\.(.+)$")
            .unwrap_or_else(|error| panic!("identifier regex failed to compile: {error}"))
    })
}

/// Parsed `user@host.domain` identifier.
///
/// ## Invariants
/// - `user`, `host` and `domain` are non-empty.
/// - `host` contains no `.`; `user` contains no `@`.
///
/// # Examples
/// ```
/// use keyserver::domain::UserHostDomain;
///
/// let uhd = UserHostDomain::parse("  alice@web.example.com ").unwrap();
/// assert_eq!(uhd.user(), "alice");
/// assert_eq!(uhd.host(), "web");
/// assert_eq!(uhd.domain(), "example.com");
/// assert_eq!(uhd.to_string(), "alice@web.example.com");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UserHostDomain {
    user: String,
    host: String,
    domain: String,
}

impl UserHostDomain {
    /// Parse an identifier, ignoring surrounding whitespace.
    pub fn parse(identifier: &str) -> Result<Self, IdentifierParseError> {
        let malformed = || IdentifierParseError::Malformed {
            identifier: identifier.to_owned(),
        };
        let captures = uhd_regex().captures(identifier.trim()).ok_or_else(malformed)?;
        let part = |index| {
            captures
                .get(index)
                .map(|m| m.as_str().to_owned())
                .ok_or_else(malformed)
        };

        Ok(Self {
            user: part(1)?,
            host: part(2)?,
            domain: part(3)?,
        })
    }

    /// User name component.
    #[must_use]
    pub fn user(&self) -> &str {
        &self.user
    }

    /// Host label component.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Domain tail (everything after the first dot following `@`).
    #[must_use]
    pub fn domain(&self) -> &str {
        &self.domain
    }
}

impl fmt::Display for UserHostDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}.{}", self.user, self.host, self.domain)
    }
}

impl FromStr for UserHostDomain {
    type Err = IdentifierParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
