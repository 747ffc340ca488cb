//! HTTP inbound adapter exposing the key management API.

pub mod authorized;
pub mod error;
pub mod health;
pub mod keys;
pub mod schemas;
pub mod state;
#[cfg(test)]
pub mod test_utils;
pub mod validation;

use actix_web::{Scope, web};

pub use error::ApiResult;

/// Versioned API scope with every key and authorization endpoint.
///
/// Handlers expect `web::Data<HttpState>` in the app data.
pub fn api_scope() -> Scope {
    web::scope("/api/v1")
        .service(authorized::list_authorized)
        .service(authorized::authorize_user)
        .service(authorized::revoke_user)
        .service(keys::get_key)
        .service(keys::register_key)
        .service(keys::delete_key)
}
