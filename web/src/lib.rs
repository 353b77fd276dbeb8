//! Axum HTTP surface for EPASS.
//!
//! A thin shell over [`epass_runtime::RegistrationService`]:
//!
//! 1. **Authenticate** the bearer token through the
//!    [`IdentityProvider`](epass_core::IdentityProvider)
//! 2. **Validate** boundary input (USN format, ticket payloads)
//! 3. **Call** the service with the authenticated user passed explicitly
//! 4. **Map** the result, or the
//!    [`RegistrationError`](epass_core::RegistrationError) kind, to a response
//!
//! # Example
//!
//! ```ignore
//! use epass_web::{AppState, build_router};
//!
//! let state = AppState::new(service, identity);
//! let app = build_router(state);
//! axum::serve(listener, app).await?;
//! ```

#![forbid(unsafe_code)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod state;
pub mod validation;

pub use error::AppError;
pub use extractors::{ApiJson, ApiQuery, AuthenticatedUser, BearerToken, CorrelationId};
pub use middleware::{CORRELATION_ID_HEADER, correlation_id_layer};
pub use routes::build_router;
pub use state::AppState;
