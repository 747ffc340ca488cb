//! Authorization edge HTTP handlers.
//!
//! ```text
//! GET    /api/v1/keys/{uhd}/authorized
//! POST   /api/v1/keys/{uhd}/authorized
//! DELETE /api/v1/keys/{uhd}/authorized/{authed_uhd}
//! ```
//!
//! Identities in paths and bodies are resolved to users through the key
//! registry before the authorization graph is touched, so an unknown
//! identity is a 404 rather than a storage error.

use actix_web::{HttpResponse, delete, get, post, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::ports::AuthorizeRequest;
use crate::domain::{AuthorizedKeyEntry, AuthorizedKeyOptions, Error, User};
use crate::inbound::http::ApiResult;
use crate::inbound::http::keys::parse_identifier;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    FieldName, ValidationCode, invalid_field_error, missing_field_error,
};

const USER_FIELD: FieldName = FieldName::new("user");
const OPTIONS_FIELD: FieldName = FieldName::new("options");

/// Request payload granting a user access to the owner's account.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizeBody {
    /// `user@host.domain` of the user being granted access.
    #[schema(example = "bob@laptop.example.com")]
    pub user: Option<String>,
    /// SSH options prefix for the `authorized_keys` line.
    #[schema(example = "no-port-forwarding,no-pty")]
    pub options: Option<String>,
}

/// One `authorized_keys` entry.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizedKeyResponse {
    /// Sequence number; ascending order is insertion order.
    pub id: i64,
    pub owner_id: String,
    pub authed_user_id: String,
    pub options: Option<String>,
    /// Owner and authorized user are the same; the entry has no effect.
    pub self_reference: bool,
}

impl From<AuthorizedKeyEntry> for AuthorizedKeyResponse {
    fn from(entry: AuthorizedKeyEntry) -> Self {
        Self {
            id: entry.id.get(),
            owner_id: entry.owner.to_string(),
            authed_user_id: entry.authed_user.to_string(),
            self_reference: entry.is_self_reference(),
            options: entry.options.map(String::from),
        }
    }
}

async fn resolve(state: &HttpState, raw: &str) -> Result<User, Error> {
    let uhd = parse_identifier(raw)?;
    Ok(state.registry_query.fetch_key(&uhd.to_string()).await?)
}

/// List the owner's entries in insertion order.
#[utoipa::path(
    get,
    path = "/api/v1/keys/{uhd}/authorized",
    params(("uhd" = String, Path, description = "Owner identifier")),
    responses(
        (status = 200, description = "Entries in insertion order", body = [AuthorizedKeyResponse]),
        (status = 400, description = "Malformed identifier", body = ErrorSchema),
        (status = 404, description = "Unknown owner", body = ErrorSchema)
    ),
    tags = ["authorized-keys"],
    operation_id = "listAuthorizedKeys"
)]
#[get("/keys/{uhd}/authorized")]
pub async fn list_authorized(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<Vec<AuthorizedKeyResponse>>> {
    let owner = resolve(&state, &path).await?;
    let entries = state.authorized_query.list_authorized(&owner.id).await?;
    Ok(web::Json(
        entries.into_iter().map(AuthorizedKeyResponse::from).collect(),
    ))
}

/// Grant a user access to the owner's account.
#[utoipa::path(
    post,
    path = "/api/v1/keys/{uhd}/authorized",
    params(("uhd" = String, Path, description = "Owner identifier")),
    request_body = AuthorizeBody,
    responses(
        (status = 201, description = "Entry created", body = AuthorizedKeyResponse),
        (status = 400, description = "Malformed identifier or options", body = ErrorSchema),
        (status = 404, description = "Unknown owner or user", body = ErrorSchema),
        (status = 409, description = "User already authorized", body = ErrorSchema)
    ),
    tags = ["authorized-keys"],
    operation_id = "authorizeUser"
)]
#[post("/keys/{uhd}/authorized")]
pub async fn authorize_user(
    state: web::Data<HttpState>,
    path: web::Path<String>,
    payload: web::Json<AuthorizeBody>,
) -> ApiResult<HttpResponse> {
    let AuthorizeBody { user, options } = payload.into_inner();
    let authed_raw = user.ok_or_else(|| missing_field_error(USER_FIELD))?;
    let options = options
        .map(AuthorizedKeyOptions::new)
        .transpose()
        .map_err(|err| invalid_field_error(OPTIONS_FIELD, ValidationCode::InvalidOptions, err))?;

    let owner = resolve(&state, &path).await?;
    let authed_user = resolve(&state, &authed_raw).await?;
    let entry = state
        .authorized
        .authorize(AuthorizeRequest {
            owner: owner.id,
            authed_user: authed_user.id,
            options,
        })
        .await?;

    Ok(HttpResponse::Created().json(AuthorizedKeyResponse::from(entry)))
}

/// Revoke a user's access. Succeeds when no entry exists.
#[utoipa::path(
    delete,
    path = "/api/v1/keys/{uhd}/authorized/{authed_uhd}",
    params(
        ("uhd" = String, Path, description = "Owner identifier"),
        ("authed_uhd" = String, Path, description = "Identifier of the user to revoke")
    ),
    responses(
        (status = 204, description = "Entry removed or absent"),
        (status = 400, description = "Malformed identifier", body = ErrorSchema),
        (status = 404, description = "Unknown owner or user", body = ErrorSchema)
    ),
    tags = ["authorized-keys"],
    operation_id = "revokeUser"
)]
#[delete("/keys/{uhd}/authorized/{authed_uhd}")]
pub async fn revoke_user(
    state: web::Data<HttpState>,
    path: web::Path<(String, String)>,
) -> ApiResult<HttpResponse> {
    let (owner_raw, authed_raw) = path.into_inner();
    let owner = resolve(&state, &owner_raw).await?;
    let authed_user = resolve(&state, &authed_raw).await?;
    state.authorized.revoke(&owner.id, &authed_user.id).await?;
    Ok(HttpResponse::NoContent().finish())
}
