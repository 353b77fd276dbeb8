//! Prometheus metrics for registration, check-in and store retries.
//!
//! # Example
//!
//! ```rust,no_run
//! use epass_runtime::metrics::MetricsServer;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut server = MetricsServer::new("0.0.0.0:9090".parse()?);
//! server.start()?;
//!
//! // Serve `server.render()` at http://localhost:9090/metrics
//! # Ok(())
//! # }
//! ```

use epass_core::{RegistrationError, Role};
use metrics::{describe_counter, describe_histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::net::SocketAddr;
use std::time::Duration;
use thiserror::Error;

// Re-export metrics macros for use in other modules
pub use metrics::{counter, histogram};

/// Errors from metrics operations.
#[derive(Error, Debug)]
pub enum MetricsError {
    /// Failed to build metrics exporter
    #[error("Failed to build metrics exporter: {0}")]
    Build(String),
    /// Failed to install metrics exporter
    #[error("Failed to install metrics exporter: {0}")]
    Install(String),
}

/// Prometheus recorder plus the address its scrape endpoint is served on.
pub struct MetricsServer {
    addr: SocketAddr,
    handle: Option<PrometheusHandle>,
}

impl MetricsServer {
    /// Create a new metrics server.
    ///
    /// # Arguments
    ///
    /// * `addr` - Socket address the scrape endpoint binds to (e.g., `0.0.0.0:9090`)
    #[must_use]
    pub const fn new(addr: SocketAddr) -> Self {
        Self { addr, handle: None }
    }

    /// Scrape endpoint address.
    #[must_use]
    pub const fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Describe every metric and install the Prometheus recorder.
    ///
    /// # Errors
    ///
    /// Returns error if the exporter cannot be built or installed.
    ///
    /// # Note
    ///
    /// If a recorder is already installed (e.g., by another test), this logs a
    /// warning and leaves [`MetricsServer::handle`] empty.
    pub fn start(&mut self) -> Result<(), MetricsError> {
        register_metrics();

        let builder = PrometheusBuilder::new()
            .set_buckets_for_metric(
                Matcher::Suffix("duration_seconds".to_string()),
                &[0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0],
            )
            .map_err(|e| MetricsError::Build(e.to_string()))?;

        match builder.install_recorder() {
            Ok(handle) => {
                self.handle = Some(handle);
                tracing::info!(addr = %self.addr, "Metrics recorder installed");
                Ok(())
            }
            Err(e) => {
                let err_msg = e.to_string();
                if err_msg.contains("already initialized") {
                    tracing::warn!(
                        "Metrics recorder already initialized, skipping re-initialization"
                    );
                    Ok(())
                } else {
                    Err(MetricsError::Install(err_msg))
                }
            }
        }
    }

    /// Get the metrics handle for rendering.
    #[must_use]
    pub const fn handle(&self) -> Option<&PrometheusHandle> {
        self.handle.as_ref()
    }

    /// Render current metrics in Prometheus format.
    ///
    /// Returns `None` if the recorder was not installed by this server.
    #[must_use]
    pub fn render(&self) -> Option<String> {
        self.handle.as_ref().map(PrometheusHandle::render)
    }
}

/// Register all metric descriptions.
pub fn register_metrics() {
    describe_counter!(
        "registrations_total",
        "Registration attempts by role and outcome"
    );
    describe_counter!("check_ins_total", "Check-in attempts by outcome");
    describe_counter!("events_created_total", "Events created");
    describe_counter!(
        "store_retries_total",
        "Retries after a transient store failure"
    );
    describe_counter!(
        "store_retry_exhausted_total",
        "Operations that stayed unavailable after every retry"
    );
    describe_histogram!(
        "registration_duration_seconds",
        "Wall time of a service operation, retries included"
    );
}

/// Stable label for an operation result.
#[must_use]
pub fn outcome_label<T>(result: &Result<T, RegistrationError>) -> &'static str {
    match result {
        Ok(_) => "ok",
        Err(RegistrationError::EventNotFound(_)) => "event_not_found",
        Err(RegistrationError::AlreadyRegistered) => "already_registered",
        Err(RegistrationError::CapacityExceeded) => "capacity_exceeded",
        Err(RegistrationError::NotRegistered) => "not_registered",
        Err(RegistrationError::AlreadyCheckedIn) => "already_checked_in",
        Err(RegistrationError::NotClubMember { .. }) => "not_club_member",
        Err(RegistrationError::DateNotInFuture(_)) => "date_not_in_future",
        Err(RegistrationError::InvalidArgument(_)) => "invalid_argument",
        Err(RegistrationError::StoreUnavailable(_)) => "store_unavailable",
        Err(RegistrationError::Timeout) => "timeout",
        Err(RegistrationError::Store(_)) => "store_error",
    }
}

/// Registration and check-in metrics recorder.
pub struct RegistrationMetrics;

impl RegistrationMetrics {
    /// Record a registration attempt.
    pub fn record_registration(role: Role, outcome: &'static str) {
        counter!("registrations_total", "role" => role.as_str(), "outcome" => outcome).increment(1);
    }

    /// Record a check-in attempt.
    pub fn record_check_in(outcome: &'static str) {
        counter!("check_ins_total", "outcome" => outcome).increment(1);
    }

    /// Record a created event.
    pub fn record_event_created() {
        counter!("events_created_total").increment(1);
    }

    /// Record how long an operation took.
    pub fn record_duration(operation: &'static str, duration: Duration) {
        histogram!("registration_duration_seconds", "operation" => operation)
            .record(duration.as_secs_f64());
    }
}

/// Retry metrics recorder.
pub struct RetryMetrics;

impl RetryMetrics {
    /// Record a retry attempt.
    pub fn record_retry(operation: &'static str) {
        counter!("store_retries_total", "operation" => operation).increment(1);
    }

    /// Record exhausted retries.
    pub fn record_exhausted(operation: &'static str) {
        counter!("store_retry_exhausted_total", "operation" => operation).increment(1);
    }
}
