//! Store wrapper that injects transient failures.

use crate::InMemoryStore;
use chrono::{DateTime, Utc};
use epass_core::error::StoreError;
use epass_core::repository::{
    CheckInOutcome, EventRepository, InsertOutcome, MembershipRepository, RegistrationRepository,
    StoreFuture, StoreStream,
};
use epass_core::types::{
    Club, ClubId, Event, EventDetails, EventId, NewEvent, RegisteredEvent, Registration, Role,
    UserId,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

/// Delegates to an [`InMemoryStore`] but fails the next `n` calls with
/// [`StoreError::Unavailable`].
///
/// [`FlakyStore::lose_next_insert_ack`] simulates a registration that commits
/// but whose reply never reaches the caller.
#[derive(Clone, Debug, Default)]
pub struct FlakyStore {
    inner: InMemoryStore,
    failures: Arc<AtomicU32>,
    lose_insert_ack: Arc<AtomicBool>,
    calls: Arc<AtomicU32>,
}

impl FlakyStore {
    /// Wrap `inner`; no failures scheduled.
    #[must_use]
    pub fn new(inner: InMemoryStore) -> Self {
        Self {
            inner,
            ..Self::default()
        }
    }

    /// Fail the next `n` calls of any kind.
    pub fn fail_next(&self, n: u32) {
        self.failures.store(n, Ordering::SeqCst);
    }

    /// Commit the next conditional insert, then report it as unavailable.
    pub fn lose_next_insert_ack(&self) {
        self.lose_insert_ack.store(true, Ordering::SeqCst);
    }

    /// Total calls received, including failed ones.
    #[must_use]
    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    /// The wrapped store.
    #[must_use]
    pub const fn inner(&self) -> &InMemoryStore {
        &self.inner
    }

    fn trip(&self) -> Result<(), StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let tripped = self
            .failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if tripped {
            Err(StoreError::Unavailable("injected failure".to_string()))
        } else {
            Ok(())
        }
    }
}

impl EventRepository for FlakyStore {
    fn insert_event(
        &self,
        organizer: UserId,
        draft: NewEvent,
        created_at: DateTime<Utc>,
    ) -> StoreFuture<'_, Event> {
        Box::pin(async move {
            self.trip()?;
            self.inner.insert_event(organizer, draft, created_at).await
        })
    }

    fn find_event(&self, event_id: EventId) -> StoreFuture<'_, Option<EventDetails>> {
        Box::pin(async move {
            self.trip()?;
            self.inner.find_event(event_id).await
        })
    }

    fn list_events(&self) -> StoreFuture<'_, Vec<EventDetails>> {
        Box::pin(async move {
            self.trip()?;
            self.inner.list_events().await
        })
    }

    fn events_organized_by(&self, organizer: UserId) -> StoreFuture<'_, Vec<EventDetails>> {
        Box::pin(async move {
            self.trip()?;
            self.inner.events_organized_by(organizer).await
        })
    }

    fn ping(&self) -> StoreFuture<'_, ()> {
        Box::pin(async move { self.trip() })
    }
}

impl RegistrationRepository for FlakyStore {
    fn find_registration(
        &self,
        event_id: EventId,
        user_id: UserId,
        role: Role,
    ) -> StoreFuture<'_, Option<Registration>> {
        Box::pin(async move {
            self.trip()?;
            self.inner.find_registration(event_id, user_id, role).await
        })
    }

    fn count_registrations(&self, event_id: EventId, role: Role) -> StoreFuture<'_, u32> {
        Box::pin(async move {
            self.trip()?;
            self.inner.count_registrations(event_id, role).await
        })
    }

    fn insert_registration(
        &self,
        event_id: EventId,
        user_id: UserId,
        role: Role,
        registered_at: DateTime<Utc>,
    ) -> StoreFuture<'_, InsertOutcome> {
        Box::pin(async move {
            self.trip()?;
            let outcome = self
                .inner
                .insert_registration(event_id, user_id, role, registered_at)
                .await?;
            if self.lose_insert_ack.swap(false, Ordering::SeqCst) {
                return Err(StoreError::Unavailable("reply lost after commit".to_string()));
            }
            Ok(outcome)
        })
    }

    fn registrations_for_user(
        &self,
        user_id: UserId,
        role: Role,
    ) -> StoreStream<'_, RegisteredEvent> {
        Box::pin(async_stream::stream! {
            if let Err(err) = self.trip() {
                yield Err(err);
                return;
            }
            for await item in self.inner.registrations_for_user(user_id, role) {
                yield item;
            }
        })
    }

    fn mark_attended(
        &self,
        event_id: EventId,
        user_id: UserId,
        role: Role,
        at: DateTime<Utc>,
    ) -> StoreFuture<'_, CheckInOutcome> {
        Box::pin(async move {
            self.trip()?;
            self.inner.mark_attended(event_id, user_id, role, at).await
        })
    }
}

impl MembershipRepository for FlakyStore {
    fn is_member(&self, user_id: UserId, club_id: ClubId) -> StoreFuture<'_, bool> {
        Box::pin(async move {
            self.trip()?;
            self.inner.is_member(user_id, club_id).await
        })
    }

    fn clubs_for_user(&self, user_id: UserId) -> StoreFuture<'_, Vec<Club>> {
        Box::pin(async move {
            self.trip()?;
            self.inner.clubs_for_user(user_id).await
        })
    }
}
