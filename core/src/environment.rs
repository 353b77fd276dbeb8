//! Injected dependencies shared by the core components.

use crate::catalog::EventCatalog;
use crate::repository::{EventRepository, MembershipRepository, RegistrationRepository};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use std::sync::Arc;

/// Clock trait - abstracts time operations for testability
///
/// # Examples
///
/// ```ignore
/// // Production - uses system clock
/// let clock = SystemClock;
///
/// // Test - fixed time for deterministic tests
/// let clock = FixedClock::new(Utc::now());
/// ```
pub trait Clock: Send + Sync {
    /// Get the current time
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Environment dependencies for registration, check-in and event creation
#[derive(Clone)]
pub struct RegistrationEnvironment {
    /// Clock for timestamps and "today"
    pub clock: Arc<dyn Clock>,
    /// Event rows
    pub events: Arc<dyn EventRepository>,
    /// Participant and volunteer rows
    pub registrations: Arc<dyn RegistrationRepository>,
    /// Club membership (read-only)
    pub memberships: Arc<dyn MembershipRepository>,
    /// Time zone that defines the calendar day
    pub time_zone: Tz,
}

impl RegistrationEnvironment {
    /// Creates a new `RegistrationEnvironment`
    #[must_use]
    pub fn new(
        clock: Arc<dyn Clock>,
        events: Arc<dyn EventRepository>,
        registrations: Arc<dyn RegistrationRepository>,
        memberships: Arc<dyn MembershipRepository>,
        time_zone: Tz,
    ) -> Self {
        Self {
            clock,
            events,
            registrations,
            memberships,
            time_zone,
        }
    }

    /// Catalog bound to this environment's time zone.
    #[must_use]
    pub const fn catalog(&self) -> EventCatalog {
        EventCatalog::new(self.time_zone)
    }
}

impl std::fmt::Debug for RegistrationEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistrationEnvironment")
            .field("time_zone", &self.time_zone)
            .finish_non_exhaustive()
    }
}
