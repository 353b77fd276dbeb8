//! Event creation.
//!
//! An event needs a non-blank name, description and location. It must be
//! dated strictly after today (in the configured time zone) and, when it names
//! a club, its organizer must belong to that club. Every check runs before
//! anything is written.

use crate::environment::RegistrationEnvironment;
use crate::error::{RegistrationError, Result};
use crate::types::{Event, EventDetails, NewEvent, UserId};

/// Creates events and lists them per organizer.
#[derive(Clone, Debug)]
pub struct EventOrganizer {
    env: RegistrationEnvironment,
}

impl EventOrganizer {
    /// Creates a new `EventOrganizer`
    #[must_use]
    pub const fn new(env: RegistrationEnvironment) -> Self {
        Self { env }
    }

    /// Create an event on behalf of `organizer`.
    ///
    /// # Errors
    ///
    /// - [`RegistrationError::InvalidArgument`] if the name, description or
    ///   location is blank
    /// - [`RegistrationError::DateNotInFuture`] if the date is today or earlier
    /// - [`RegistrationError::NotClubMember`] if the organizer is not in the
    ///   named club
    /// - [`RegistrationError::StoreUnavailable`] / [`RegistrationError::Store`]
    ///   on store failure
    pub async fn create_event(&self, organizer: UserId, draft: NewEvent) -> Result<Event> {
        for (field, value) in [
            ("name", &draft.name),
            ("description", &draft.description),
            ("location", &draft.location),
        ] {
            if value.trim().is_empty() {
                return Err(RegistrationError::InvalidArgument(format!(
                    "event {field} must not be empty"
                )));
            }
        }

        let now = self.env.clock.now();
        let today = self.env.catalog().today(now);
        if draft.date <= today {
            tracing::info!(
                organizer = %organizer,
                date = %draft.date,
                %today,
                "Event creation rejected: date not in the future"
            );
            return Err(RegistrationError::DateNotInFuture(draft.date));
        }

        if let Some(club_id) = draft.club_id {
            let member = self
                .env
                .memberships
                .is_member(organizer.clone(), club_id)
                .await?;
            if !member {
                tracing::warn!(
                    organizer = %organizer,
                    %club_id,
                    "Event creation rejected: organizer not in club"
                );
                return Err(RegistrationError::NotClubMember {
                    user_id: organizer,
                    club_id,
                });
            }
        }

        let event = self
            .env
            .events
            .insert_event(organizer.clone(), draft, now)
            .await?;

        tracing::info!(event_id = %event.id, organizer = %organizer, "Event created");
        Ok(event)
    }

    /// Events created by `organizer`, in creation order.
    ///
    /// # Errors
    ///
    /// Returns a store error if the query fails.
    pub async fn organized_by(&self, organizer: UserId) -> Result<Vec<EventDetails>> {
        Ok(self.env.events.events_organized_by(organizer).await?)
    }
}
