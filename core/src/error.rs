//! Error taxonomy for registration, capacity and check-in.
//!
//! Two layers:
//!
//! - [`StoreError`]: what a repository reports about the data store itself.
//! - [`RegistrationError`]: what a core operation reports to its caller.
//!
//! Only [`RegistrationError::StoreUnavailable`] is eligible for automatic retry.

use crate::types::{ClubId, EventId, UserId};
use chrono::NaiveDate;
use thiserror::Error;

/// Errors raised by repository implementations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Transient failure reaching the store (connection refused, pool
    /// exhausted, I/O timeout). Safe to retry.
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// The store rejected the operation.
    #[error("Database error: {0}")]
    Database(String),

    /// A stored row could not be decoded into a domain value.
    #[error("Decode error: {0}")]
    Decode(String),
}

impl StoreError {
    /// Whether the failure is transient.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

/// Errors returned by core operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistrationError {
    /// The referenced event does not exist.
    #[error("Event {0} not found")]
    EventNotFound(EventId),

    /// The user already holds this role for the event.
    #[error("Already registered for this event")]
    AlreadyRegistered,

    /// No slots left for the role at commit time.
    #[error("No slots available")]
    CapacityExceeded,

    /// Check-in for a user with no participant registration.
    #[error("Participant not registered for this event")]
    NotRegistered,

    /// The ticket was already scanned.
    #[error("Participant already checked in")]
    AlreadyCheckedIn,

    /// Event creation under a club the organizer does not belong to.
    #[error("User {user_id} is not a member of club {club_id}")]
    NotClubMember {
        /// Organizer attempting the creation
        user_id: UserId,
        /// Club named on the event
        club_id: ClubId,
    },

    /// Event creation with a date that is today or earlier.
    #[error("Event date {0} must be in the future")]
    DateNotInFuture(NaiveDate),

    /// Programmer error: malformed argument reached the core.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Transient data store failure. The only retryable kind.
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// The operation did not finish within its deadline. The outcome is
    /// unknown; retrying is safe because registration is idempotent.
    #[error("Operation timed out")]
    Timeout,

    /// Non-transient store failure.
    #[error("Store error: {0}")]
    Store(String),
}

impl RegistrationError {
    /// Whether the error may be retried automatically.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::StoreUnavailable(_))
    }
}

impl From<StoreError> for RegistrationError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Unavailable(msg) => Self::StoreUnavailable(msg),
            StoreError::Database(msg) | StoreError::Decode(msg) => Self::Store(msg),
        }
    }
}

/// Errors raised while categorizing events.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    /// The event's date could not be interpreted as a calendar day.
    #[error("Event {event_id} has a malformed date: {raw}")]
    MalformedDate {
        /// Offending event
        event_id: EventId,
        /// Raw value as received
        raw: String,
    },
}

/// Convenience alias for core results.
pub type Result<T> = std::result::Result<T, RegistrationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_unavailable_is_transient() {
        assert!(RegistrationError::from(StoreError::Unavailable("down".into())).is_transient());
        assert!(!RegistrationError::from(StoreError::Database("constraint".into())).is_transient());
        assert!(!RegistrationError::CapacityExceeded.is_transient());
        assert!(!RegistrationError::Timeout.is_transient());
    }

    #[test]
    fn decode_failures_are_not_retried() {
        let err = RegistrationError::from(StoreError::Decode("bad role".into()));
        assert_eq!(err, RegistrationError::Store("bad role".into()));
    }
}
