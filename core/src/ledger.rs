//! Registration ledger: creates and queries participant and volunteer rows.
//!
//! `register` checks its preconditions in a fixed order so that each failure
//! is reported as a distinct kind:
//!
//! 1. the event exists, else [`RegistrationError::EventNotFound`]
//! 2. no row for (event, user, role), else [`RegistrationError::AlreadyRegistered`]
//! 3. a slot is open, else [`RegistrationError::CapacityExceeded`]
//!
//! Steps 2 and 3 are re-evaluated by the store at commit time through
//! [`RegistrationRepository::insert_registration`], so the early reads only
//! shape the error; they never decide admission on their own.
//!
//! [`RegistrationRepository::insert_registration`]:
//!     crate::repository::RegistrationRepository::insert_registration

use crate::capacity::CapacityGuard;
use crate::environment::RegistrationEnvironment;
use crate::error::{RegistrationError, Result};
use crate::repository::InsertOutcome;
use crate::types::{EventId, EventView, RegisteredEvent, Registration, Role, UserId};
use futures::{Stream, StreamExt};

/// Creates and lists registrations.
#[derive(Clone, Debug)]
pub struct RegistrationLedger {
    env: RegistrationEnvironment,
    guard: CapacityGuard,
}

impl RegistrationLedger {
    /// Creates a new `RegistrationLedger`
    #[must_use]
    pub fn new(env: RegistrationEnvironment) -> Self {
        let guard = CapacityGuard::new(env.clone());
        Self { env, guard }
    }

    /// Capacity guard sharing this ledger's environment.
    #[must_use]
    pub const fn guard(&self) -> &CapacityGuard {
        &self.guard
    }

    /// Register `user_id` for `event_id` in `role`.
    ///
    /// Safe to retry: a retry after a committed registration reports
    /// [`RegistrationError::AlreadyRegistered`] and writes nothing.
    ///
    /// # Errors
    ///
    /// - [`RegistrationError::EventNotFound`] if the event does not exist
    /// - [`RegistrationError::AlreadyRegistered`] if the user already holds the role
    /// - [`RegistrationError::CapacityExceeded`] if no slot is open at commit time
    /// - [`RegistrationError::StoreUnavailable`] / [`RegistrationError::Store`]
    ///   on store failure
    pub async fn register(
        &self,
        event_id: EventId,
        user_id: UserId,
        role: Role,
    ) -> Result<Registration> {
        let details = self
            .env
            .events
            .find_event(event_id)
            .await?
            .ok_or(RegistrationError::EventNotFound(event_id))?;

        let existing = self
            .env
            .registrations
            .find_registration(event_id, user_id.clone(), role)
            .await?;
        if existing.is_some() {
            tracing::info!(%event_id, %user_id, %role, "Duplicate registration rejected");
            return Err(RegistrationError::AlreadyRegistered);
        }

        let slots = self.guard.remaining_for(&details.event, role).await?;
        if !slots.is_available() {
            tracing::info!(%event_id, %user_id, %role, "Registration rejected: no slots");
            return Err(RegistrationError::CapacityExceeded);
        }

        let now = self.env.clock.now();
        let outcome = self
            .env
            .registrations
            .insert_registration(event_id, user_id.clone(), role, now)
            .await?;

        match outcome {
            InsertOutcome::Inserted(registration) => {
                tracing::info!(%event_id, %user_id, %role, "Registration recorded");
                Ok(registration)
            }
            InsertOutcome::Duplicate => {
                tracing::info!(
                    %event_id,
                    %user_id,
                    %role,
                    "Concurrent duplicate registration rejected"
                );
                Err(RegistrationError::AlreadyRegistered)
            }
            InsertOutcome::Full => {
                tracing::info!(%event_id, %user_id, %role, "Last slot taken at commit time");
                Err(RegistrationError::CapacityExceeded)
            }
            InsertOutcome::EventMissing => Err(RegistrationError::EventNotFound(event_id)),
        }
    }

    /// Every registration `user_id` holds in `role`, joined with event details.
    ///
    /// The stream is lazy and holds no cursor between calls; call again to
    /// re-fetch.
    pub fn list_for_user(
        &self,
        user_id: UserId,
        role: Role,
    ) -> impl Stream<Item = Result<RegisteredEvent>> + Send + '_ {
        self.env
            .registrations
            .registrations_for_user(user_id, role)
            .map(|item| item.map_err(RegistrationError::from))
    }

    /// Number of registrations for `event_id` in `role`.
    ///
    /// An aggregate: an unknown event counts zero.
    ///
    /// # Errors
    ///
    /// Returns a store error if counting fails.
    pub async fn list_for_event(&self, event_id: EventId, role: Role) -> Result<u32> {
        Ok(self
            .env
            .registrations
            .count_registrations(event_id, role)
            .await?)
    }

    /// An event as seen by `viewer`: display names, the viewer's roles, and
    /// open slots for both roles.
    ///
    /// # Errors
    ///
    /// - [`RegistrationError::EventNotFound`] if the event does not exist
    /// - a store error if any lookup fails
    pub async fn view_event(&self, event_id: EventId, viewer: UserId) -> Result<EventView> {
        let details = self
            .env
            .events
            .find_event(event_id)
            .await?
            .ok_or(RegistrationError::EventNotFound(event_id))?;

        let is_participant = self.holds(event_id, viewer.clone(), Role::Participant).await?;
        let is_volunteer = self.holds(event_id, viewer.clone(), Role::Volunteer).await?;
        let participant_slots = self.guard.remaining_for(&details.event, Role::Participant).await?;
        let volunteer_slots = self.guard.remaining_for(&details.event, Role::Volunteer).await?;

        Ok(EventView {
            is_organizer: details.event.organizer == viewer,
            details,
            is_participant,
            is_volunteer,
            participant_slots,
            volunteer_slots,
        })
    }

    /// Whether `user_id` holds `role` for `event_id`.
    ///
    /// # Errors
    ///
    /// Returns a store error if the lookup fails.
    pub async fn holds(&self, event_id: EventId, user_id: UserId, role: Role) -> Result<bool> {
        Ok(self
            .env
            .registrations
            .find_registration(event_id, user_id, role)
            .await?
            .is_some())
    }
}
