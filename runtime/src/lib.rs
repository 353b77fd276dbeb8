//! # EPASS Runtime
//!
//! Runtime concerns around the registration core.
//!
//! ## Components
//!
//! - **[`RegistrationService`]**: the facade handlers call; adds retry,
//!   deadlines and metrics to every core operation
//! - **[`retry`]**: bounded exponential backoff for transient store failures
//! - **[`metrics`]**: Prometheus recorder and metric recorders
//! - **[`health`]**: readiness reporting
//!
//! ## Example
//!
//! ```ignore
//! use epass_runtime::{RegistrationService, ServiceConfig};
//!
//! let service = RegistrationService::new(env, ServiceConfig::default());
//! let registration = service.register(event_id, user_id, Role::Volunteer).await?;
//! ```

/// Retry logic with exponential backoff
pub mod retry;

/// Prometheus metrics for observability
pub mod metrics;

/// Readiness reporting
pub mod health;

/// Service facade over the core components
pub mod service;

pub use health::{HealthCheck, HealthStatus};
pub use retry::RetryPolicy;
pub use service::{RegistrationService, ServiceConfig};
