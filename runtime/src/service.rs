//! `RegistrationService`: the facade the HTTP layer calls.
//!
//! Wraps the core components with three runtime concerns:
//!
//! - bounded retry with backoff, for [`RegistrationError::StoreUnavailable`] only
//! - a per-operation deadline that maps to [`RegistrationError::Timeout`]
//! - Prometheus counters and a latency histogram
//!
//! Event creation is not idempotent, so it gets the deadline but no retry.

use crate::health::HealthCheck;
use crate::metrics::{RegistrationMetrics, outcome_label};
use crate::retry::{RetryPolicy, retry_with_predicate};
use epass_core::{
    Categorized, CheckInProcessor, Club, Event, EventDetails, EventId, EventOrganizer, EventView,
    NewEvent, RegisteredEvent, Registration, RegistrationEnvironment, RegistrationError,
    RegistrationLedger, Result, Role, Slots, TicketCode, UserId,
};
use futures::TryStreamExt;
use std::future::Future;
use std::time::{Duration, Instant};

/// Pings slower than this report `Degraded`.
const SLOW_PING: Duration = Duration::from_millis(500);

/// Runtime settings for [`RegistrationService`].
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceConfig {
    /// Retry policy for transient store failures
    pub retry: RetryPolicy,
    /// Deadline for one operation, retries included
    pub operation_timeout: Duration,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            operation_timeout: Duration::from_secs(5),
        }
    }
}

/// Registration, check-in and event operations with retry, deadline and metrics.
#[derive(Clone, Debug)]
pub struct RegistrationService {
    env: RegistrationEnvironment,
    ledger: RegistrationLedger,
    checker: CheckInProcessor,
    organizer: EventOrganizer,
    config: ServiceConfig,
}

impl RegistrationService {
    /// Creates a new `RegistrationService`
    #[must_use]
    pub fn new(env: RegistrationEnvironment, config: ServiceConfig) -> Self {
        Self {
            ledger: RegistrationLedger::new(env.clone()),
            checker: CheckInProcessor::new(env.clone()),
            organizer: EventOrganizer::new(env.clone()),
            env,
            config,
        }
    }

    /// The environment the components run against.
    #[must_use]
    pub const fn environment(&self) -> &RegistrationEnvironment {
        &self.env
    }

    /// Register `user_id` for `event_id` in `role`.
    ///
    /// A transient failure after the store committed is retried and then
    /// reported as [`RegistrationError::AlreadyRegistered`].
    ///
    /// # Errors
    ///
    /// See [`RegistrationLedger::register`], plus [`RegistrationError::Timeout`].
    pub async fn register(
        &self,
        event_id: EventId,
        user_id: UserId,
        role: Role,
    ) -> Result<Registration> {
        let result = self
            .retrying("register", || self.ledger.register(event_id, user_id.clone(), role))
            .await;
        RegistrationMetrics::record_registration(role, outcome_label(&result));
        result
    }

    /// Check a participant in.
    ///
    /// # Errors
    ///
    /// See [`CheckInProcessor::check_in`], plus [`RegistrationError::Timeout`].
    pub async fn check_in(&self, user_id: UserId, event_id: EventId) -> Result<Registration> {
        let result = self
            .retrying("check_in", || self.checker.check_in(user_id.clone(), event_id))
            .await;
        RegistrationMetrics::record_check_in(outcome_label(&result));
        result
    }

    /// Decode a scanned ticket and check its holder in.
    ///
    /// # Errors
    ///
    /// [`RegistrationError::InvalidArgument`] for an unreadable payload, then
    /// everything [`RegistrationService::check_in`] returns.
    pub async fn check_in_ticket(&self, payload: &str) -> Result<Registration> {
        match TicketCode::parse(payload) {
            Ok(ticket) => self.check_in(ticket.user_id, ticket.event_id).await,
            Err(err) => {
                RegistrationMetrics::record_check_in(outcome_label::<()>(&Err(err.clone())));
                Err(err)
            }
        }
    }

    /// Create an event. Not retried.
    ///
    /// # Errors
    ///
    /// See [`EventOrganizer::create_event`], plus [`RegistrationError::Timeout`].
    pub async fn create_event(&self, organizer: UserId, draft: NewEvent) -> Result<Event> {
        let result = self
            .once("create_event", self.organizer.create_event(organizer, draft))
            .await;
        if result.is_ok() {
            RegistrationMetrics::record_event_created();
        }
        result
    }

    /// Events created by `organizer`.
    ///
    /// # Errors
    ///
    /// Store errors after retries, or [`RegistrationError::Timeout`].
    pub async fn organized_by(&self, organizer: UserId) -> Result<Vec<EventDetails>> {
        self.retrying("organized_by", || self.organizer.organized_by(organizer.clone()))
            .await
    }

    /// One event as seen by `viewer`.
    ///
    /// # Errors
    ///
    /// See [`RegistrationLedger::view_event`], plus [`RegistrationError::Timeout`].
    pub async fn event_details(&self, event_id: EventId, viewer: UserId) -> Result<EventView> {
        self.retrying("event_details", || self.ledger.view_event(event_id, viewer.clone()))
            .await
    }

    /// All events, bucketed by the environment's clock and time zone.
    ///
    /// # Errors
    ///
    /// Store errors after retries, or [`RegistrationError::Timeout`].
    pub async fn catalog(&self) -> Result<Categorized<EventDetails>> {
        let events = self
            .retrying("catalog", || async {
                self.env.events.list_events().await.map_err(RegistrationError::from)
            })
            .await?;
        Ok(self.env.catalog().categorize(events, self.env.clock.now()))
    }

    /// Remaining slots for both roles, participant first.
    ///
    /// # Errors
    ///
    /// [`RegistrationError::EventNotFound`], store errors after retries, or
    /// [`RegistrationError::Timeout`].
    pub async fn slots(&self, event_id: EventId) -> Result<(Slots, Slots)> {
        self.retrying("slots", || async {
            let guard = self.ledger.guard();
            let participants = guard.remaining_slots(event_id, Role::Participant).await?;
            let volunteers = guard.remaining_slots(event_id, Role::Volunteer).await?;
            Ok::<_, RegistrationError>((participants, volunteers))
        })
        .await
    }

    /// Number of registrations for `event_id` in `role`; zero for unknown events.
    ///
    /// # Errors
    ///
    /// Store errors after retries, or [`RegistrationError::Timeout`].
    pub async fn registration_count(&self, event_id: EventId, role: Role) -> Result<u32> {
        self.retrying("registration_count", || self.ledger.list_for_event(event_id, role))
            .await
    }

    /// Every registration `user_id` holds in `role`, joined with event details.
    ///
    /// # Errors
    ///
    /// Store errors after retries, or [`RegistrationError::Timeout`].
    pub async fn registrations_for(
        &self,
        user_id: UserId,
        role: Role,
    ) -> Result<Vec<RegisteredEvent>> {
        self.retrying("registrations_for", || {
            self.ledger.list_for_user(user_id.clone(), role).try_collect()
        })
        .await
    }

    /// Clubs `user_id` belongs to.
    ///
    /// # Errors
    ///
    /// Store errors after retries, or [`RegistrationError::Timeout`].
    pub async fn clubs_for(&self, user_id: UserId) -> Result<Vec<Club>> {
        self.retrying("clubs_for", || async {
            self.env
                .memberships
                .clubs_for_user(user_id.clone())
                .await
                .map_err(RegistrationError::from)
        })
        .await
    }

    /// Ping the store once, without retry.
    pub async fn health(&self) -> HealthCheck {
        let start = Instant::now();
        let result =
            tokio::time::timeout(self.config.operation_timeout, self.env.events.ping()).await;
        let elapsed = start.elapsed();
        let latency_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);

        match result {
            Ok(Ok(())) if elapsed > SLOW_PING => {
                HealthCheck::degraded("store", latency_ms, "slow round trip")
            }
            Ok(Ok(())) => HealthCheck::healthy("store", latency_ms),
            Ok(Err(err)) => {
                tracing::warn!(error = %err, "Store readiness check failed");
                HealthCheck::unhealthy("store", latency_ms, err.to_string())
            }
            Err(_) => HealthCheck::unhealthy("store", latency_ms, "timed out"),
        }
    }

    async fn retrying<T, F, Fut>(&self, operation: &'static str, attempt: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let policy = self.config.retry.clone();
        self.once(
            operation,
            retry_with_predicate(policy, operation, attempt, RegistrationError::is_transient),
        )
        .await
    }

    async fn once<T>(
        &self,
        operation: &'static str,
        fut: impl Future<Output = Result<T>>,
    ) -> Result<T> {
        let start = Instant::now();
        let result = match tokio::time::timeout(self.config.operation_timeout, fut).await {
            Ok(result) => result,
            Err(_) => {
                let timeout_ms =
                    u64::try_from(self.config.operation_timeout.as_millis()).unwrap_or(u64::MAX);
                tracing::warn!(
                    operation,
                    timeout_ms,
                    "Operation timed out; outcome unknown"
                );
                Err(RegistrationError::Timeout)
            }
        };
        RegistrationMetrics::record_duration(operation, start.elapsed());
        result
    }
}
