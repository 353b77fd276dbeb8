//! Check-in: the one-way `Registered → Attended` transition.
//!
//! The transition runs as a single conditional update in the store, so two
//! scanners reading the same ticket at once produce exactly one `CheckedIn`
//! and one [`RegistrationError::AlreadyCheckedIn`]. No time window is applied.

use crate::environment::RegistrationEnvironment;
use crate::error::{RegistrationError, Result};
use crate::repository::CheckInOutcome;
use crate::ticket::TicketCode;
use crate::types::{EventId, Registration, Role, UserId};

/// Marks participants as attended.
#[derive(Clone, Debug)]
pub struct CheckInProcessor {
    env: RegistrationEnvironment,
}

impl CheckInProcessor {
    /// Creates a new `CheckInProcessor`
    #[must_use]
    pub const fn new(env: RegistrationEnvironment) -> Self {
        Self { env }
    }

    /// Mark `user_id`'s participant registration for `event_id` as attended.
    ///
    /// # Errors
    ///
    /// - [`RegistrationError::NotRegistered`] if the user holds no participant
    ///   registration for the event
    /// - [`RegistrationError::AlreadyCheckedIn`] if the ticket was already scanned
    /// - [`RegistrationError::StoreUnavailable`] / [`RegistrationError::Store`]
    ///   on store failure
    pub async fn check_in(&self, user_id: UserId, event_id: EventId) -> Result<Registration> {
        let now = self.env.clock.now();
        let outcome = self
            .env
            .registrations
            .mark_attended(event_id, user_id.clone(), Role::Participant, now)
            .await?;

        match outcome {
            CheckInOutcome::CheckedIn(registration) => {
                tracing::info!(%event_id, %user_id, "Participant checked in");
                Ok(registration)
            }
            CheckInOutcome::NotRegistered => {
                tracing::warn!(%event_id, %user_id, "Check-in for unregistered participant");
                Err(RegistrationError::NotRegistered)
            }
            CheckInOutcome::AlreadyAttended => {
                tracing::warn!(%event_id, %user_id, "Ticket scanned twice");
                Err(RegistrationError::AlreadyCheckedIn)
            }
        }
    }

    /// Decode a scanned QR payload and check the holder in.
    ///
    /// # Errors
    ///
    /// [`RegistrationError::InvalidArgument`] for an unreadable payload, then
    /// everything [`CheckInProcessor::check_in`] returns.
    pub async fn check_in_ticket(&self, payload: &str) -> Result<Registration> {
        let ticket = TicketCode::parse(payload)?;
        self.check_in(ticket.user_id, ticket.event_id).await
    }
}
