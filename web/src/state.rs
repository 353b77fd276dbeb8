//! Application state for Axum handlers.

use epass_core::IdentityProvider;
use epass_runtime::RegistrationService;
use std::sync::Arc;

/// Application state shared across all HTTP handlers.
///
/// Cloned (cheaply via `Arc`) for each request.
#[derive(Clone)]
pub struct AppState {
    /// Registration, check-in and event operations
    pub service: Arc<RegistrationService>,

    /// Resolves bearer tokens to users
    pub identity: Arc<dyn IdentityProvider>,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(service: RegistrationService, identity: Arc<dyn IdentityProvider>) -> Self {
        Self {
            service: Arc::new(service),
            identity,
        }
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("service", &self.service)
            .finish_non_exhaustive()
    }
}
