//! OpenAPI documentation configuration.
//!
//! Registers every handler under `/api/v1` plus the health probes, and the
//! request/response schemas they use. The document is served by Swagger UI
//! in debug builds and exported via `cargo run --bin openapi-dump`.

use utoipa::OpenApi;

use crate::inbound::http::authorized::{AuthorizeBody, AuthorizedKeyResponse};
use crate::inbound::http::keys::{IdentityResponse, RegisterKeyBody};
use crate::inbound::http::schemas::{ErrorCodeSchema, ErrorSchema};

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Key server API",
        description = "Registry of SSH public keys per user@host.domain identity and the authorized_keys edges between them."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    paths(
        crate::inbound::http::keys::get_key,
        crate::inbound::http::keys::register_key,
        crate::inbound::http::keys::delete_key,
        crate::inbound::http::authorized::list_authorized,
        crate::inbound::http::authorized::authorize_user,
        crate::inbound::http::authorized::revoke_user,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        RegisterKeyBody,
        IdentityResponse,
        AuthorizeBody,
        AuthorizedKeyResponse,
        ErrorSchema,
        ErrorCodeSchema
    )),
    tags(
        (name = "keys", description = "Identity and public key registration"),
        (name = "authorized-keys", description = "Authorization edges between users"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use utoipa::openapi::RefOr;
    use utoipa::openapi::schema::Schema;

    fn schema_has_field(schema: &RefOr<Schema>, field: &str) -> bool {
        match schema {
            RefOr::T(Schema::Object(obj)) => obj.properties.contains_key(field),
            _ => false,
        }
    }

    #[rstest]
    #[case("/api/v1/keys/{uhd}")]
    #[case("/api/v1/keys/{uhd}/authorized")]
    #[case("/api/v1/keys/{uhd}/authorized/{authed_uhd}")]
    #[case("/health/ready")]
    #[case("/health/live")]
    fn document_lists_path(#[case] path: &str) {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key(path), "missing path {path}");
    }

    #[rstest]
    #[case("IdentityResponse", "fingerprint")]
    #[case("RegisterKeyBody", "allowUpdate")]
    #[case("AuthorizedKeyResponse", "selfReference")]
    fn schemas_use_camel_case_fields(#[case] schema: &str, #[case] field: &str) {
        let doc = ApiDoc::openapi();
        let schemas = &doc.components.as_ref().expect("components").schemas;
        let found = schemas.get(schema).expect("schema registered");
        assert!(schema_has_field(found, field), "{schema} lacks {field}");
    }
}
