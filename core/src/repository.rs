//! Repository traits for the external collaborators.
//!
//! The core never talks to a database directly. It consumes four narrow
//! interfaces:
//!
//! - [`EventRepository`]: event rows
//! - [`RegistrationRepository`]: participant and volunteer rows, including the
//!   atomic conditional insert that closes the check-then-act race
//! - [`MembershipRepository`]: read-only club membership
//! - [`IdentityProvider`]: bearer token to user identifier
//!
//! # Implementations
//!
//! - `PostgresStore` (in `epass-postgres`): production
//! - `InMemoryStore` (in `epass-testing`): fast, deterministic tests
//!
//! # Dyn Compatibility
//!
//! Methods return `Pin<Box<dyn Future>>` rather than `async fn` so that the
//! components can hold `Arc<dyn EventRepository>` and friends.

use crate::error::StoreError;
use crate::types::{
    Club, ClubId, Event, EventDetails, EventId, NewEvent, RegisteredEvent, Registration, Role,
    UserId,
};
use chrono::{DateTime, Utc};
use futures::Stream;
use std::future::Future;
use std::pin::Pin;

/// Boxed future returned by repository methods.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + Send + 'a>>;

/// Boxed, lazily-evaluated stream returned by listing methods.
///
/// Finite; a caller that wants the data again calls the method again.
pub type StoreStream<'a, T> = Pin<Box<dyn Stream<Item = Result<T, StoreError>> + Send + 'a>>;

/// Result of the atomic conditional insert.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InsertOutcome {
    /// Row written with status `Registered`.
    Inserted(Registration),
    /// A row for (event, user, role) already existed.
    Duplicate,
    /// The role was full when the insert was attempted.
    Full,
    /// The event vanished between the caller's read and the insert.
    EventMissing,
}

/// Result of the atomic attendance update.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CheckInOutcome {
    /// Status moved from `Registered` to `Attended`.
    CheckedIn(Registration),
    /// No registration for (event, user, role).
    NotRegistered,
    /// Status was already `Attended`; nothing changed.
    AlreadyAttended,
}

/// Event rows.
pub trait EventRepository: Send + Sync {
    /// Persist a new event and return it with its assigned identifier.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the insert fails.
    fn insert_event(
        &self,
        organizer: UserId,
        draft: NewEvent,
        created_at: DateTime<Utc>,
    ) -> StoreFuture<'_, Event>;

    /// Load one event with display names.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the query fails. A missing event is `Ok(None)`.
    fn find_event(&self, event_id: EventId) -> StoreFuture<'_, Option<EventDetails>>;

    /// All events, in store insertion order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the query fails.
    fn list_events(&self) -> StoreFuture<'_, Vec<EventDetails>>;

    /// Events created by one organizer, in store insertion order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the query fails.
    fn events_organized_by(&self, organizer: UserId) -> StoreFuture<'_, Vec<EventDetails>>;

    /// Cheapest possible round trip, used by readiness checks.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the store cannot be reached.
    fn ping(&self) -> StoreFuture<'_, ()> {
        Box::pin(async { Ok(()) })
    }
}

/// Participant and volunteer registrations.
pub trait RegistrationRepository: Send + Sync {
    /// Look up one registration.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the query fails.
    fn find_registration(
        &self,
        event_id: EventId,
        user_id: UserId,
        role: Role,
    ) -> StoreFuture<'_, Option<Registration>>;

    /// Number of registrations for (event, role). Zero for unknown events.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the query fails.
    fn count_registrations(&self, event_id: EventId, role: Role) -> StoreFuture<'_, u32>;

    /// Insert a registration only if the event exists, no row for
    /// (event, user, role) exists, and the role's limit admits one more.
    ///
    /// All three conditions are evaluated in the same atomic unit as the
    /// insert. Implementations must not rely on an earlier read.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the transaction fails.
    fn insert_registration(
        &self,
        event_id: EventId,
        user_id: UserId,
        role: Role,
        registered_at: DateTime<Utc>,
    ) -> StoreFuture<'_, InsertOutcome>;

    /// Every registration a user holds in a role, joined with event details.
    fn registrations_for_user(
        &self,
        user_id: UserId,
        role: Role,
    ) -> StoreStream<'_, RegisteredEvent>;

    /// Move a registration from `Registered` to `Attended` in one atomic step.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the update fails.
    fn mark_attended(
        &self,
        event_id: EventId,
        user_id: UserId,
        role: Role,
        at: DateTime<Utc>,
    ) -> StoreFuture<'_, CheckInOutcome>;
}

/// Read-only view of club membership, owned by club management.
pub trait MembershipRepository: Send + Sync {
    /// Whether `user_id` belongs to `club_id`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the query fails.
    fn is_member(&self, user_id: UserId, club_id: ClubId) -> StoreFuture<'_, bool>;

    /// Clubs the user belongs to.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the query fails.
    fn clubs_for_user(&self, user_id: UserId) -> StoreFuture<'_, Vec<Club>>;
}

/// Resolves a request credential to an authenticated user.
pub trait IdentityProvider: Send + Sync {
    /// `Ok(None)` means unauthenticated.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the backing store cannot be reached.
    fn authenticate<'a>(&'a self, token: &'a str) -> StoreFuture<'a, Option<UserId>>;
}
