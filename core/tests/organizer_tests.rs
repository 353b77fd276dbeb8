//! Event creation rules and catalog bucketing through the environment.

#![allow(clippy::unwrap_used)] // Tests can unwrap

use epass_core::{Clock, EventOrganizer, EventRepository, Fee, RegistrationError, Scheduled};
use epass_testing::helpers::{test_today, user};
use epass_testing::{InMemoryStore, environment, fixtures, test_clock};

#[tokio::test]
async fn non_member_cannot_create_club_event() {
    let store = InMemoryStore::new();
    let club = store.add_club("Coding Club");
    let organizer = EventOrganizer::new(environment(&store, test_clock()));
    let outsider = user("1BM21CS009");

    let result = organizer
        .create_event(
            outsider.clone(),
            fixtures::club_event(fixtures::days_from(test_today(), 3), club),
        )
        .await;

    assert_eq!(
        result,
        Err(RegistrationError::NotClubMember {
            user_id: outsider,
            club_id: club,
        })
    );
    assert_eq!(store.event_count(), 0);
}

#[tokio::test]
async fn member_creates_club_event() {
    let store = InMemoryStore::new();
    let club = store.add_club("Coding Club");
    let member = user("1BM21CS010");
    store.add_member(member.clone(), club);
    let organizer = EventOrganizer::new(environment(&store, test_clock()));

    let event = organizer
        .create_event(
            member.clone(),
            fixtures::club_event(fixtures::days_from(test_today(), 3), club),
        )
        .await
        .unwrap();

    assert_eq!(event.club_id, Some(club));
    assert_eq!(event.organizer, member);
    assert_eq!(event.fee, Fee::FREE);
    assert_eq!(event.created_at, test_clock().now());

    let mine = organizer.organized_by(member).await.unwrap();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].club_name.as_deref(), Some("Coding Club"));
}

#[tokio::test]
async fn event_dated_today_or_earlier_is_rejected() {
    let store = InMemoryStore::new();
    let organizer = EventOrganizer::new(environment(&store, test_clock()));
    let today = test_today();

    for date in [today, fixtures::days_from(today, -1)] {
        let result = organizer
            .create_event(user("1BM21CS010"), fixtures::event_on(date))
            .await;
        assert_eq!(result, Err(RegistrationError::DateNotInFuture(date)));
    }
    assert_eq!(store.event_count(), 0);

    let tomorrow = fixtures::days_from(today, 1);
    organizer
        .create_event(user("1BM21CS010"), fixtures::event_on(tomorrow))
        .await
        .unwrap();
    assert_eq!(store.event_count(), 1);
}

#[tokio::test]
async fn blank_required_text_is_invalid() {
    let store = InMemoryStore::new();
    let organizer = EventOrganizer::new(environment(&store, test_clock()));
    let draft = || fixtures::event_on(fixtures::days_from(test_today(), 2));

    let mut blank_name = draft();
    blank_name.name = "   ".to_string();
    let mut blank_description = draft();
    blank_description.description = String::new();
    let mut blank_location = draft();
    blank_location.location = " \t".to_string();

    for (field, draft) in [
        ("name", blank_name),
        ("description", blank_description),
        ("location", blank_location),
    ] {
        let result = organizer.create_event(user("1BM21CS010"), draft).await;
        assert!(
            matches!(&result, Err(RegistrationError::InvalidArgument(m)) if m.contains(field)),
            "blank {field}: {result:?}"
        );
    }
    assert_eq!(store.event_count(), 0);
}

#[tokio::test]
async fn organized_by_lists_only_own_events_in_creation_order() {
    let store = InMemoryStore::new();
    let organizer = EventOrganizer::new(environment(&store, test_clock()));
    let me = user("1BM21CS010");
    let them = user("1BM21CS011");

    for (who, days) in [(&me, 5), (&them, 2), (&me, 1)] {
        organizer
            .create_event(who.clone(), fixtures::event_on(fixtures::days_from(test_today(), days)))
            .await
            .unwrap();
    }

    let mine = organizer.organized_by(me).await.unwrap();
    let days: Vec<_> = mine.iter().map(|d| d.scheduled_on().unwrap()).collect();
    assert_eq!(
        days,
        vec![
            fixtures::days_from(test_today(), 5),
            fixtures::days_from(test_today(), 1)
        ]
    );
}

#[tokio::test]
async fn catalog_buckets_seeded_events() {
    let store = InMemoryStore::new();
    let env = environment(&store, test_clock());
    let today = test_today();
    let org = user("1BM20CS100");
    store.seed_event(org.clone(), fixtures::event_on(fixtures::days_from(today, -2)));
    store.seed_event(org.clone(), fixtures::event_on(today));
    store.seed_event(org, fixtures::event_on(fixtures::days_from(today, 9)));

    let events = store.list_events().await.unwrap();
    let out = env.catalog().categorize(events, test_clock().now());

    assert_eq!(out.ongoing.len(), 1);
    assert_eq!(out.completed.len(), 1);
    assert_eq!(out.upcoming.len(), 1);
    assert_eq!(out.ongoing[0].event.date, today);
}
