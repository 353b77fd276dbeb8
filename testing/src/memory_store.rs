//! In-memory implementation of every repository trait.
//!
//! All state sits behind one mutex, so each trait method is atomic with
//! respect to every other call. That makes the conditional insert and the
//! attendance update behave like their transactional Postgres counterparts.

#![allow(clippy::unwrap_used)] // Test infrastructure uses unwrap for simplicity
#![allow(clippy::missing_panics_doc)] // Panics only on a poisoned mutex

use chrono::{DateTime, Utc};
use epass_core::repository::{
    CheckInOutcome, EventRepository, InsertOutcome, MembershipRepository, RegistrationRepository,
    StoreFuture, StoreStream,
};
use epass_core::types::{
    AttendanceStatus, Club, ClubId, Event, EventDetails, EventId, NewEvent, RegisteredEvent,
    Registration, Role, UserId,
};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

#[derive(Debug, Default)]
struct State {
    next_event_id: i64,
    events: Vec<Event>,
    registrations: Vec<Registration>,
    clubs: Vec<Club>,
    members: HashSet<(UserId, ClubId)>,
    names: HashMap<UserId, String>,
}

impl State {
    fn event(&self, event_id: EventId) -> Option<&Event> {
        self.events.iter().find(|e| e.id == event_id)
    }

    fn details(&self, event: &Event) -> EventDetails {
        EventDetails {
            event: event.clone(),
            club_name: event
                .club_id
                .and_then(|id| self.clubs.iter().find(|c| c.id == id))
                .map(|c| c.name.clone()),
            organizer_name: self.names.get(&event.organizer).cloned(),
        }
    }

    fn count(&self, event_id: EventId, role: Role) -> u32 {
        let n = self
            .registrations
            .iter()
            .filter(|r| r.event_id == event_id && r.role == role)
            .count();
        u32::try_from(n).unwrap_or(u32::MAX)
    }

    fn position(&self, event_id: EventId, user_id: &UserId, role: Role) -> Option<usize> {
        self.registrations
            .iter()
            .position(|r| r.event_id == event_id && &r.user_id == user_id && r.role == role)
    }

    fn push_event(
        &mut self,
        organizer: UserId,
        draft: NewEvent,
        created_at: DateTime<Utc>,
    ) -> Event {
        self.next_event_id += 1;
        let event = Event {
            id: EventId::new(self.next_event_id),
            name: draft.name,
            description: draft.description,
            date: draft.date,
            time: draft.time,
            location: draft.location,
            max_participants: draft.max_participants,
            max_volunteers: draft.max_volunteers,
            fee: draft.fee,
            organizer,
            club_id: draft.club_id,
            created_at,
        };
        self.events.push(event.clone());
        event
    }
}

/// Mutex-guarded, insertion-ordered store for fast, deterministic tests.
///
/// Clones share the same underlying state.
///
/// # Example
///
/// ```ignore
/// let store = InMemoryStore::new();
/// let club = store.add_club("Coding Club");
/// store.add_member(UserId::new("1BM21CS001"), club);
/// ```
#[derive(Clone, Debug, Default)]
pub struct InMemoryStore {
    state: Arc<Mutex<State>>,
}

impl InMemoryStore {
    /// Create a new empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a club and return its identifier.
    pub fn add_club(&self, name: &str) -> ClubId {
        let mut state = self.state.lock().unwrap();
        let id = ClubId::new(i64::try_from(state.clubs.len()).unwrap_or(i64::MAX) + 1);
        state.clubs.push(Club {
            id,
            name: name.to_string(),
            description: None,
        });
        id
    }

    /// Make `user` a member of `club`.
    pub fn add_member(&self, user: UserId, club: ClubId) {
        self.state.lock().unwrap().members.insert((user, club));
    }

    /// Record a display name for `user`.
    pub fn add_student(&self, user: UserId, name: &str) {
        self.state.lock().unwrap().names.insert(user, name.to_string());
    }

    /// Insert an event directly, bypassing the organizer rules.
    ///
    /// Useful for past or same-day events, which `create_event` refuses.
    pub fn seed_event(&self, organizer: UserId, draft: NewEvent) -> Event {
        self.state
            .lock()
            .unwrap()
            .push_event(organizer, draft, Utc::now())
    }

    /// Number of stored events.
    #[must_use]
    pub fn event_count(&self) -> usize {
        self.state.lock().unwrap().events.len()
    }

    /// Snapshot of every registration, in insertion order.
    #[must_use]
    pub fn registrations(&self) -> Vec<Registration> {
        self.state.lock().unwrap().registrations.clone()
    }

    fn registered_events(&self, user_id: &UserId, role: Role) -> Vec<RegisteredEvent> {
        let state = self.state.lock().unwrap();
        state
            .registrations
            .iter()
            .filter(|r| &r.user_id == user_id && r.role == role)
            .filter_map(|r| {
                state.event(r.event_id).map(|e| RegisteredEvent {
                    event: state.details(e),
                    registration: r.clone(),
                })
            })
            .collect()
    }
}

impl EventRepository for InMemoryStore {
    fn insert_event(
        &self,
        organizer: UserId,
        draft: NewEvent,
        created_at: DateTime<Utc>,
    ) -> StoreFuture<'_, Event> {
        Box::pin(async move {
            Ok(self
                .state
                .lock()
                .unwrap()
                .push_event(organizer, draft, created_at))
        })
    }

    fn find_event(&self, event_id: EventId) -> StoreFuture<'_, Option<EventDetails>> {
        Box::pin(async move {
            let state = self.state.lock().unwrap();
            Ok(state.event(event_id).map(|e| state.details(e)))
        })
    }

    fn list_events(&self) -> StoreFuture<'_, Vec<EventDetails>> {
        Box::pin(async move {
            let state = self.state.lock().unwrap();
            Ok(state.events.iter().map(|e| state.details(e)).collect())
        })
    }

    fn events_organized_by(&self, organizer: UserId) -> StoreFuture<'_, Vec<EventDetails>> {
        Box::pin(async move {
            let state = self.state.lock().unwrap();
            Ok(state
                .events
                .iter()
                .filter(|e| e.organizer == organizer)
                .map(|e| state.details(e))
                .collect())
        })
    }
}

impl RegistrationRepository for InMemoryStore {
    fn find_registration(
        &self,
        event_id: EventId,
        user_id: UserId,
        role: Role,
    ) -> StoreFuture<'_, Option<Registration>> {
        Box::pin(async move {
            let state = self.state.lock().unwrap();
            Ok(state
                .position(event_id, &user_id, role)
                .map(|i| state.registrations[i].clone()))
        })
    }

    fn count_registrations(&self, event_id: EventId, role: Role) -> StoreFuture<'_, u32> {
        Box::pin(async move { Ok(self.state.lock().unwrap().count(event_id, role)) })
    }

    fn insert_registration(
        &self,
        event_id: EventId,
        user_id: UserId,
        role: Role,
        registered_at: DateTime<Utc>,
    ) -> StoreFuture<'_, InsertOutcome> {
        Box::pin(async move {
            let mut state = self.state.lock().unwrap();

            let Some(limit) = state.event(event_id).map(|e| e.limit_for(role)) else {
                return Ok(InsertOutcome::EventMissing);
            };
            if state.position(event_id, &user_id, role).is_some() {
                return Ok(InsertOutcome::Duplicate);
            }
            if !limit.admits(state.count(event_id, role)) {
                return Ok(InsertOutcome::Full);
            }

            let registration = Registration {
                event_id,
                user_id,
                role,
                status: AttendanceStatus::Registered,
                registered_at,
                checked_in_at: None,
            };
            state.registrations.push(registration.clone());
            Ok(InsertOutcome::Inserted(registration))
        })
    }

    fn registrations_for_user(
        &self,
        user_id: UserId,
        role: Role,
    ) -> StoreStream<'_, RegisteredEvent> {
        Box::pin(async_stream::stream! {
            for item in self.registered_events(&user_id, role) {
                yield Ok(item);
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
            let mut state = self.state.lock().unwrap();
            let Some(i) = state.position(event_id, &user_id, role) else {
                return Ok(CheckInOutcome::NotRegistered);
            };

            let registration = &mut state.registrations[i];
            if registration.status == AttendanceStatus::Attended {
                return Ok(CheckInOutcome::AlreadyAttended);
            }
            registration.status = AttendanceStatus::Attended;
            registration.checked_in_at = Some(at);
            Ok(CheckInOutcome::CheckedIn(registration.clone()))
        })
    }
}

impl MembershipRepository for InMemoryStore {
    fn is_member(&self, user_id: UserId, club_id: ClubId) -> StoreFuture<'_, bool> {
        Box::pin(async move {
            Ok(self
                .state
                .lock()
                .unwrap()
                .members
                .contains(&(user_id, club_id)))
        })
    }

    fn clubs_for_user(&self, user_id: UserId) -> StoreFuture<'_, Vec<Club>> {
        Box::pin(async move {
            let state = self.state.lock().unwrap();
            Ok(state
                .clubs
                .iter()
                .filter(|c| state.members.contains(&(user_id.clone(), c.id)))
                .cloned()
                .collect())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use chrono::NaiveDate;
    use futures::TryStreamExt;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 2, 1).unwrap()
    }

    #[tokio::test]
    async fn conditional_insert_respects_limit_and_uniqueness() {
        let store = InMemoryStore::new();
        let event = store.seed_event(
            UserId::new("1BM20CS100"),
            fixtures::capped_event(date(), Some(1), None),
        );
        let now = Utc::now();
        let a = UserId::new("1BM21CS001");
        let b = UserId::new("1BM21CS002");

        let first = store
            .insert_registration(event.id, a.clone(), Role::Participant, now)
            .await
            .unwrap();
        assert!(matches!(first, InsertOutcome::Inserted(_)));

        let again = store
            .insert_registration(event.id, a, Role::Participant, now)
            .await
            .unwrap();
        assert_eq!(again, InsertOutcome::Duplicate);

        let full = store
            .insert_registration(event.id, b, Role::Participant, now)
            .await
            .unwrap();
        assert_eq!(full, InsertOutcome::Full);

        let missing = store
            .insert_registration(EventId::new(999), UserId::new("x"), Role::Volunteer, now)
            .await
            .unwrap();
        assert_eq!(missing, InsertOutcome::EventMissing);
    }

    #[tokio::test]
    async fn registrations_for_user_joins_display_names() {
        let store = InMemoryStore::new();
        let organizer = UserId::new("1BM20CS100");
        let club = store.add_club("Robotics");
        store.add_student(organizer.clone(), "Asha");
        let event = store.seed_event(organizer, fixtures::club_event(date(), club));
        let user = UserId::new("1BM21CS001");
        store
            .insert_registration(event.id, user.clone(), Role::Volunteer, Utc::now())
            .await
            .unwrap();

        let listed: Vec<_> = store
            .registrations_for_user(user.clone(), Role::Volunteer)
            .try_collect()
            .await
            .unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].event.club_name.as_deref(), Some("Robotics"));
        assert_eq!(listed[0].event.organizer_name.as_deref(), Some("Asha"));

        let as_participant: Vec<_> = store
            .registrations_for_user(user, Role::Participant)
            .try_collect()
            .await
            .unwrap();
        assert!(as_participant.is_empty());
    }
}
