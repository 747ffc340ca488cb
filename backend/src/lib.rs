//! SSH public-key identity registry.
//!
//! Identities are `user@host.domain` triples stored as a Domain → Host →
//! User hierarchy, each user holding one public key. Authorization edges
//! between users form the lines of an owner's `authorized_keys` file.

pub mod doc;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;

/// Public OpenAPI surface used by Swagger UI and tooling.
pub use doc::ApiDoc;
pub use domain::TraceId;
pub use middleware::Trace;
