//! End-to-end tests for the HTTP surface over an in-memory store.

#![allow(clippy::unwrap_used, clippy::expect_used)] // Test code can use unwrap/expect

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use epass_runtime::{RegistrationService, RetryPolicy, ServiceConfig};
use epass_testing::helpers::{flaky_environment, init_test_tracing, test_today, user};
use epass_testing::{
    FlakyStore, InMemoryStore, StaticIdentityProvider, environment, fixtures, test_clock,
};
use epass_web::{AppState, CORRELATION_ID_HEADER, build_router};
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;

const STUDENT: &str = "student-token";
const OTHER: &str = "other-token";
const STAFF: &str = "staff-token";

fn identity() -> StaticIdentityProvider {
    StaticIdentityProvider::new()
        .with_token(STUDENT, user("1BM21CS001"))
        .with_token(OTHER, user("1BM21CS002"))
        .with_token(STAFF, user("1BM20CS100"))
}

fn app(store: &InMemoryStore) -> Router {
    init_test_tracing();
    let env = environment(store, test_clock());
    let service = RegistrationService::new(env, ServiceConfig::default());
    build_router(AppState::new(service, Arc::new(identity())))
}

async fn send(request: Request<Body>, app: &Router) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, json)
}

fn request(method: &str, uri: &str, token: Option<&str>) -> axum::http::request::Builder {
    let builder = Request::builder().method(method).uri(uri);
    match token {
        Some(token) => builder.header(header::AUTHORIZATION, format!("Bearer {token}")),
        None => builder,
    }
}

async fn get(app: &Router, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
    send(request("GET", uri, token).body(Body::empty()).unwrap(), app).await
}

async fn post(app: &Router, uri: &str, token: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = request("POST", uri, Some(token));
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    send(request, app).await
}

#[tokio::test]
async fn health_is_public_and_api_requires_a_token() {
    let store = InMemoryStore::new();
    let app = app(&store);

    let (status, body) = get(&app, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    let (status, body) = get(&app, "/ready", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");

    let (status, body) = get(&app, "/api/events", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "UNAUTHORIZED");

    let (status, _) = get(&app, "/api/events", Some("forged")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn responses_echo_correlation_id() {
    let store = InMemoryStore::new();
    let request = Request::builder()
        .uri("/health")
        .header(CORRELATION_ID_HEADER, "1b4e28ba-2fa1-11d2-883f-0016d3cca427")
        .body(Body::empty())
        .unwrap();

    let response = app(&store).oneshot(request).await.unwrap();

    assert_eq!(
        response.headers().get(CORRELATION_ID_HEADER).unwrap(),
        "1b4e28ba-2fa1-11d2-883f-0016d3cca427"
    );
}

#[tokio::test]
async fn registration_flow_reports_conflicts() {
    let store = InMemoryStore::new();
    let event = store.seed_event(
        user("1BM20CS100"),
        fixtures::capped_event(fixtures::days_from(test_today(), 2), Some(1), Some(0)),
    );
    let app = app(&store);
    let join = format!("/api/events/{}/join", event.id);

    let (status, body) = post(&app, &join, STUDENT, None).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["user_id"], "1BM21CS001");
    assert_eq!(body["status"], "registered");

    let (status, body) = post(&app, &join, STUDENT, None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "ALREADY_REGISTERED");

    let (status, body) = post(&app, &join, OTHER, None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "CAPACITY_EXCEEDED");

    let volunteer = format!("/api/events/{}/volunteer", event.id);
    let (status, body) = post(&app, &volunteer, OTHER, None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "CAPACITY_EXCEEDED");

    let (status, body) = post(&app, "/api/events/9999/join", STUDENT, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "EVENT_NOT_FOUND");
}

#[tokio::test]
async fn slots_counts_and_details() {
    let store = InMemoryStore::new();
    let event = store.seed_event(
        user("1BM20CS100"),
        fixtures::capped_event(fixtures::days_from(test_today(), 2), Some(3), None),
    );
    let app = app(&store);
    let base = format!("/api/events/{}", event.id);
    post(&app, &format!("{base}/join"), STUDENT, None).await;

    let (status, body) = get(&app, &format!("{base}/slots"), Some(OTHER)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["participants"], json!({ "remaining": 2 }));
    assert_eq!(body["volunteers"], "unlimited");

    let (_, body) = get(&app, &format!("{base}/participant-count"), Some(OTHER)).await;
    assert_eq!(body["count"], 1);
    let (_, body) = get(&app, &format!("{base}/volunteer-count"), Some(OTHER)).await;
    assert_eq!(body["count"], 0);
    let (status, body) = get(&app, "/api/events/9999/participant-count", Some(OTHER)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 0);

    let (status, body) = get(&app, &base, Some(STUDENT)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["is_participant"], true);
    assert_eq!(body["is_volunteer"], false);
    assert_eq!(body["is_organizer"], false);

    let (status, body) = get(&app, "/api/events/9999", Some(STUDENT)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "EVENT_NOT_FOUND");
}

#[tokio::test]
async fn check_in_by_fields_and_by_payload() {
    let store = InMemoryStore::new();
    let event = store.seed_event(user("1BM20CS100"), fixtures::event_on(test_today()));
    let app = app(&store);
    post(&app, &format!("/api/events/{}/join", event.id), STUDENT, None).await;
    post(&app, &format!("/api/events/{}/join", event.id), OTHER, None).await;

    let direct = json!({ "usn": "1BM21CS001", "event_id": event.id });
    let (status, body) = post(&app, "/api/check-in", STAFF, Some(direct.clone())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "attended");

    let (status, body) = post(&app, "/api/check-in", STAFF, Some(direct)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "ALREADY_CHECKED_IN");

    let payload = format!("https://epass.example/ticket?usn=1BM21CS002&eid={}", event.id);
    let scanned = json!({ "payload": payload });
    let (status, body) = post(&app, "/api/check-in", STAFF, Some(scanned)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user_id"], "1BM21CS002");

    let stranger = json!({ "usn": "1BM21CS777", "event_id": event.id });
    let (status, body) = post(&app, "/api/check-in", STAFF, Some(stranger)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_REGISTERED");
}

#[tokio::test]
async fn check_in_rejects_malformed_input() {
    let store = InMemoryStore::new();
    let event = store.seed_event(user("1BM20CS100"), fixtures::event_on(test_today()));
    let app = app(&store);

    let bad_usn = json!({ "usn": "not-a-usn", "event_id": event.id });
    let (status, body) = post(&app, "/api/check-in", STAFF, Some(bad_usn)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "VALIDATION_ERROR");

    let bad_payload = json!({ "payload": "usn=1BM21CS001" });
    let (status, body) = post(&app, "/api/check-in", STAFF, Some(bad_payload)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn create_event_and_list_mine() {
    let store = InMemoryStore::new();
    let coding = store.add_club("Coding Club");
    store.add_member(user("1BM21CS001"), coding);
    let app = app(&store);
    let tomorrow = fixtures::days_from(test_today(), 1);

    let draft = json!({
        "name": "Hack Night",
        "description": "Overnight build session",
        "date": tomorrow,
        "time": "18:00:00",
        "location": "Main Auditorium",
        "max_participants": 50,
        "club_id": coding,
    });
    let (status, body) = post(&app, "/api/events", STUDENT, Some(draft.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["organizer"], "1BM21CS001");
    assert_eq!(body["fee"], 0);

    let (status, body) = post(&app, "/api/events", OTHER, Some(draft)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "NOT_CLUB_MEMBER");
    assert_eq!(store.event_count(), 1);

    let past = json!({
        "name": "Same Day",
        "description": "Morning quiz",
        "date": test_today(),
        "time": "09:00:00",
        "location": "Hall B",
    });
    let (status, body) = post(&app, "/api/events", STUDENT, Some(past)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "DATE_NOT_IN_FUTURE");

    let (_, body) = get(&app, "/api/me/organized", Some(STUDENT)).await;
    assert_eq!(body.as_array().map(Vec::len), Some(1));
    let (_, body) = get(&app, "/api/me/clubs", Some(STUDENT)).await;
    assert_eq!(body[0]["name"], "Coding Club");

    let (status, body) = get(&app, "/api/events", Some(OTHER)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["upcoming"].as_array().map(Vec::len), Some(1));
    assert_eq!(body["ongoing"].as_array().map(Vec::len), Some(0));
}

#[tokio::test]
async fn my_registrations_filters_by_role() {
    let store = InMemoryStore::new();
    let event = store.seed_event(
        user("1BM20CS100"),
        fixtures::event_on(fixtures::days_from(test_today(), 3)),
    );
    let app = app(&store);
    post(&app, &format!("/api/events/{}/volunteer", event.id), STUDENT, None).await;

    let (_, body) = get(&app, "/api/me/registrations", Some(STUDENT)).await;
    assert_eq!(body.as_array().map(Vec::len), Some(0));

    let volunteering = "/api/me/registrations?role=volunteer";
    let (status, body) = get(&app, volunteering, Some(STUDENT)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().map(Vec::len), Some(1));
    assert_eq!(body[0]["registration"]["role"], "volunteer");
}

#[tokio::test]
async fn unavailable_store_maps_to_try_again() {
    let store = FlakyStore::new(InMemoryStore::new());
    let service = RegistrationService::new(
        flaky_environment(&store, test_clock()),
        ServiceConfig {
            retry: RetryPolicy::none(),
            ..ServiceConfig::default()
        },
    );
    let app = build_router(AppState::new(service, Arc::new(identity())));
    store.fail_next(1);

    let (status, body) = get(&app, "/api/events", Some(STUDENT)).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["code"], "TRY_AGAIN");

    store.fail_next(1);
    let (status, body) = get(&app, "/ready", None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["status"], "unhealthy");
}

#[tokio::test]
async fn unknown_role_is_a_validation_error() {
    let store = InMemoryStore::new();
    let app = app(&store);

    let (status, body) = get(&app, "/api/me/registrations?role=organizer", Some(STUDENT)).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert!(body["message"].as_str().is_some_and(|m| !m.is_empty()));
}

#[tokio::test]
async fn malformed_event_bodies_get_json_errors() {
    let store = InMemoryStore::new();
    let app = app(&store);
    let tomorrow = fixtures::days_from(test_today(), 1);

    let bad_date = json!({
        "name": "Hack Night",
        "description": "Overnight build session",
        "date": "16/10/2026",
        "time": "18:00:00",
        "location": "Main Auditorium",
    });
    let (status, body) = post(&app, "/api/events", STUDENT, Some(bad_date)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "VALIDATION_ERROR");

    let no_time = json!({
        "name": "Hack Night",
        "description": "Overnight build session",
        "date": tomorrow,
        "location": "Main Auditorium",
    });
    let (status, body) = post(&app, "/api/events", STUDENT, Some(no_time)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "VALIDATION_ERROR");

    let truncated = request("POST", "/api/events", Some(STUDENT))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"name": "#))
        .unwrap();
    let (status, body) = send(truncated, &app).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "VALIDATION_ERROR");

    let check_in = request("POST", "/api/check-in", Some(STAFF))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"usn": 7}"#))
        .unwrap();
    let (status, body) = send(check_in, &app).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert_eq!(store.event_count(), 0);
}

#[tokio::test]
async fn blank_description_or_location_is_rejected() {
    let store = InMemoryStore::new();
    let app = app(&store);
    let tomorrow = fixtures::days_from(test_today(), 1);

    let draft = json!({
        "name": "Hack Night",
        "description": "",
        "date": tomorrow,
        "time": "18:00:00",
        "location": "   ",
    });
    let (status, body) = post(&app, "/api/events", STUDENT, Some(draft)).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert_eq!(store.event_count(), 0);
}

#[tokio::test]
async fn rejected_requests_still_echo_correlation_id() {
    let store = InMemoryStore::new();
    let id = "1b4e28ba-2fa1-11d2-883f-0016d3cca427";
    let request = request("GET", "/api/me/clubs", Some("forged"))
        .header(CORRELATION_ID_HEADER, id)
        .body(Body::empty())
        .unwrap();

    let response = app(&store).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(response.headers().get(CORRELATION_ID_HEADER).unwrap(), id);
}
