//! Test helpers for inbound HTTP components.

use std::sync::Arc;

use actix_web::dev::{Service, ServiceResponse};
use actix_web::{App, test as actix_test, web};
use serde_json::Value;

use crate::inbound::http::api_scope;
use crate::inbound::http::state::HttpState;
use crate::outbound::memory::InMemoryIdentityStore;

/// Initialise the API over a fresh in-memory store.
///
/// Returns the service and the store so tests can inspect row counts.
pub async fn init_api() -> (
    impl Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error>,
    Arc<InMemoryIdentityStore>,
) {
    let store = Arc::new(InMemoryIdentityStore::new());
    let state = HttpState::from_store(store.clone());
    let app = actix_test::init_service(
        App::new()
            .app_data(web::Data::new(state))
            .service(api_scope()),
    )
    .await;
    (app, store)
}

/// Read a JSON response body.
pub async fn read_json(response: ServiceResponse) -> Value {
    let body = actix_test::read_body(response).await;
    serde_json::from_slice(&body).expect("response body is JSON")
}

/// Value of `details.code` in an error payload.
pub fn detail_code(payload: &Value) -> Option<&str> {
    payload
        .get("details")
        .and_then(|details| details.get("code"))
        .and_then(Value::as_str)
}
