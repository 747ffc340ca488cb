//! Shared HTTP adapter state.
//!
//! Handlers receive this via `actix_web::web::Data` and only see driving
//! ports, so they stay testable without I/O.

use std::sync::Arc;

use crate::domain::ports::{
    AuthorizedKeyRepository, AuthorizedKeysCommand, AuthorizedKeysQuery, IdentityRepository,
    KeyRegistryCommand, KeyRegistryQuery,
};
use crate::domain::{AuthorizationService, KeyRegistryService};

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub registry: Arc<dyn KeyRegistryCommand>,
    pub registry_query: Arc<dyn KeyRegistryQuery>,
    pub authorized: Arc<dyn AuthorizedKeysCommand>,
    pub authorized_query: Arc<dyn AuthorizedKeysQuery>,
}

impl HttpState {
    /// Wire the registry and authorization services over one store that
    /// implements both driven ports.
    pub fn from_store<S>(store: Arc<S>) -> Self
    where
        S: IdentityRepository + AuthorizedKeyRepository + 'static,
    {
        Self::from_repositories(store.clone(), store)
    }

    /// Wire the services over separate repositories.
    pub fn from_repositories<R, A>(identities: Arc<R>, edges: Arc<A>) -> Self
    where
        R: IdentityRepository + 'static,
        A: AuthorizedKeyRepository + 'static,
    {
        let registry = Arc::new(KeyRegistryService::new(identities));
        let authorization = Arc::new(AuthorizationService::new(edges));
        Self {
            registry: registry.clone(),
            registry_query: registry,
            authorized: authorization.clone(),
            authorized_query: authorization,
        }
    }
}
