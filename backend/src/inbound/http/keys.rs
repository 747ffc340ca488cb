//! Key registry HTTP handlers.
//!
//! ```text
//! GET    /api/v1/keys/{uhd}
//! POST   /api/v1/keys/{uhd}
//! DELETE /api/v1/keys/{uhd}
//! ```

use actix_web::{HttpResponse, delete, get, post, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::ports::{RegisterKeyRequest, RegistrationOutcome, RegistryError};
use crate::domain::{Error, PublicKey, User, UserHostDomain};
use crate::inbound::http::ApiResult;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    FieldName, ValidationCode, invalid_field_error, missing_field_error,
};

const KEY_FIELD: FieldName = FieldName::new("key");

/// Request payload for registering or replacing a key.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterKeyBody {
    /// OpenSSH public key line.
    pub key: Option<String>,
    /// Comment stored on a newly created user.
    pub comment: Option<String>,
    /// Replace the key if the user already exists.
    #[serde(default)]
    pub allow_update: bool,
}

/// Identity record returned by the key endpoints.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct IdentityResponse {
    pub id: String,
    /// Canonical `user@host.domain`.
    #[schema(example = "alice@web.example.com")]
    pub identifier: String,
    pub user: String,
    pub host: String,
    pub domain: String,
    pub key: String,
    #[schema(example = "ssh-ed25519")]
    pub key_type: Option<String>,
    #[schema(example = "SHA256:47DEQpj8HBSa+/TImW+5JCeuQeRkm5NMpJWZG3hSuFU")]
    pub fingerprint: Option<String>,
    pub comment: Option<String>,
}

impl IdentityResponse {
    fn new(uhd: &UserHostDomain, user: User) -> Self {
        Self {
            id: user.id.to_string(),
            identifier: uhd.to_string(),
            user: uhd.user().to_owned(),
            host: uhd.host().to_owned(),
            domain: uhd.domain().to_owned(),
            key_type: user.pub_key.key_type().map(str::to_owned),
            fingerprint: user.pub_key.fingerprint(),
            key: user.pub_key.into(),
            comment: user.comment,
        }
    }
}

pub(crate) fn parse_identifier(raw: &str) -> Result<UserHostDomain, Error> {
    UserHostDomain::parse(raw).map_err(|err| RegistryError::from(err).into())
}

/// Fetch the key registered for an identity.
#[utoipa::path(
    get,
    path = "/api/v1/keys/{uhd}",
    params(("uhd" = String, Path, description = "user@host.domain identifier")),
    responses(
        (status = 200, description = "Registered identity", body = IdentityResponse),
        (status = 400, description = "Malformed identifier", body = ErrorSchema),
        (status = 404, description = "Unknown identity", body = ErrorSchema),
        (status = 503, description = "Store unavailable", body = ErrorSchema)
    ),
    tags = ["keys"],
    operation_id = "getKey"
)]
#[get("/keys/{uhd}")]
pub async fn get_key(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<IdentityResponse>> {
    let uhd = parse_identifier(&path)?;
    let user = state.registry_query.fetch_key(&uhd.to_string()).await?;
    Ok(web::Json(IdentityResponse::new(&uhd, user)))
}

/// Register a key, or replace it when `allowUpdate` is set.
#[utoipa::path(
    post,
    path = "/api/v1/keys/{uhd}",
    params(("uhd" = String, Path, description = "user@host.domain identifier")),
    request_body = RegisterKeyBody,
    responses(
        (status = 201, description = "User created", body = IdentityResponse),
        (status = 200, description = "Existing user's key replaced", body = IdentityResponse),
        (status = 400, description = "Malformed identifier or key", body = ErrorSchema),
        (status = 409, description = "User exists and allowUpdate is false", body = ErrorSchema),
        (status = 503, description = "Store unavailable", body = ErrorSchema)
    ),
    tags = ["keys"],
    operation_id = "registerKey"
)]
#[post("/keys/{uhd}")]
pub async fn register_key(
    state: web::Data<HttpState>,
    path: web::Path<String>,
    payload: web::Json<RegisterKeyBody>,
) -> ApiResult<HttpResponse> {
    let uhd = parse_identifier(&path)?;
    let RegisterKeyBody {
        key,
        comment,
        allow_update,
    } = payload.into_inner();
    let key = key.ok_or_else(|| missing_field_error(KEY_FIELD))?;
    let public_key = PublicKey::new(key)
        .map_err(|err| invalid_field_error(KEY_FIELD, ValidationCode::InvalidPublicKey, err))?;

    let mut request =
        RegisterKeyRequest::new(uhd.to_string(), public_key).with_allow_update(allow_update);
    if let Some(comment) = comment {
        request = request.with_comment(comment);
    }
    let registered = state.registry.register_key(request).await?;

    let body = IdentityResponse::new(&uhd, registered.user);
    Ok(match registered.outcome {
        RegistrationOutcome::Created => HttpResponse::Created().json(body),
        RegistrationOutcome::Updated => HttpResponse::Ok().json(body),
    })
}

/// Remove an identity's user and its authorization edges.
#[utoipa::path(
    delete,
    path = "/api/v1/keys/{uhd}",
    params(("uhd" = String, Path, description = "user@host.domain identifier")),
    responses(
        (status = 204, description = "User removed"),
        (status = 400, description = "Malformed identifier", body = ErrorSchema),
        (status = 404, description = "Unknown identity", body = ErrorSchema)
    ),
    tags = ["keys"],
    operation_id = "deleteKey"
)]
#[delete("/keys/{uhd}")]
pub async fn delete_key(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let uhd = parse_identifier(&path)?;
    state.registry.remove_user(&uhd.to_string()).await?;
    Ok(HttpResponse::NoContent().finish())
}
