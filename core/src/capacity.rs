//! Remaining-slot computation and admission checks.
//!
//! Every call re-reads the current count; nothing is cached between requests.
//! The answer is advisory: two callers can both see the last slot. The atomic
//! insert in the registration repository is what keeps the count within the
//! limit.

use crate::environment::RegistrationEnvironment;
use crate::error::{RegistrationError, Result};
use crate::types::{Event, EventId, Role, SlotLimit, Slots};

/// Answers "is there room for one more in this role?"
#[derive(Clone, Debug)]
pub struct CapacityGuard {
    env: RegistrationEnvironment,
}

impl CapacityGuard {
    /// Creates a new `CapacityGuard`
    #[must_use]
    pub const fn new(env: RegistrationEnvironment) -> Self {
        Self { env }
    }

    /// Remaining slots for `role` on `event_id`.
    ///
    /// # Errors
    ///
    /// - [`RegistrationError::EventNotFound`] if the event does not exist
    /// - [`RegistrationError::StoreUnavailable`] / [`RegistrationError::Store`]
    ///   on store failure
    pub async fn remaining_slots(&self, event_id: EventId, role: Role) -> Result<Slots> {
        let details = self
            .env
            .events
            .find_event(event_id)
            .await?
            .ok_or(RegistrationError::EventNotFound(event_id))?;

        self.remaining_for(&details.event, role).await
    }

    /// Whether `role` on `event_id` has an open slot right now.
    ///
    /// # Errors
    ///
    /// Same as [`CapacityGuard::remaining_slots`].
    pub async fn can_register(&self, event_id: EventId, role: Role) -> Result<bool> {
        Ok(self.remaining_slots(event_id, role).await?.is_available())
    }

    /// Remaining slots for an event already loaded by the caller.
    ///
    /// Skips the count entirely when the role is unlimited.
    ///
    /// # Errors
    ///
    /// Returns a store error if counting fails.
    pub async fn remaining_for(&self, event: &Event, role: Role) -> Result<Slots> {
        let limit = event.limit_for(role);
        if matches!(limit, SlotLimit::Unlimited) {
            return Ok(Slots::Unlimited);
        }

        let current = self
            .env
            .registrations
            .count_registrations(event.id, role)
            .await?;

        tracing::debug!(
            event_id = %event.id,
            role = %role,
            current,
            "Computed remaining slots"
        );

        Ok(limit.remaining(current))
    }
}
