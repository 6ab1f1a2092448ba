//! Client-side services

pub mod catalog;
pub mod requests;
pub mod session;

use std::sync::Arc;
use std::time::Duration;

use crate::api::{Api, ProfileApi};
use crate::config::AppConfig;

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub session: Arc<session::SessionGate>,
    pub catalog: catalog::CatalogService,
    pub requests: Arc<requests::RequestsService>,
    /// Opaque profile collaborator, exposed for the dashboard greeting.
    pub profile: Arc<dyn ProfileApi>,
}

impl Services {
    /// Create all services over the given gateway
    pub fn new(api: Api, config: &AppConfig) -> Self {
        let session = Arc::new(session::SessionGate::new(api.auth.clone()));
        let catalog = catalog::CatalogService::new(
            api.catalog.clone(),
            session.clone(),
            Duration::from_millis(config.search.debounce_ms),
        );
        let requests = Arc::new(requests::RequestsService::new(
            api.requests.clone(),
            session.clone(),
        ));
        Self {
            session,
            catalog,
            requests,
            profile: api.profile,
        }
    }

    /// Close the session and drop all state derived from it.
    pub fn logout(&self) {
        self.session.logout();
        self.requests.reset();
    }
}
