//! Event endpoints.
//!
//! - `GET /api/events` - catalog, bucketed into ongoing / completed / upcoming
//! - `POST /api/events` - create an event
//! - `GET /api/events/:id` - details as seen by the caller
//! - `GET /api/events/:id/slots` - remaining slots for both roles
//! - `GET /api/events/:id/participant-count` and `/volunteer-count`
//! - `POST /api/events/:id/join` and `/volunteer` - register

use crate::error::AppError;
use crate::extractors::{ApiJson, AuthenticatedUser};
use crate::state::AppState;
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use epass_core::{
    Categorized, Event, EventDetails, EventId, EventView, NewEvent, Registration, Role, Slots,
};
use serde::Serialize;

/// Remaining slots for both roles.
#[derive(Debug, Serialize)]
pub struct SlotsResponse {
    /// Participant slots
    pub participants: Slots,
    /// Volunteer slots
    pub volunteers: Slots,
}

/// Number of registrations in one role.
#[derive(Debug, Serialize)]
pub struct CountResponse {
    /// Registration count
    pub count: u32,
}

/// List all events, bucketed by the configured time zone.
///
/// # Errors
///
/// Store failures.
pub async fn list_events(
    _user: AuthenticatedUser,
    State(state): State<AppState>,
) -> Result<Json<Categorized<EventDetails>>, AppError> {
    Ok(Json(state.service.catalog().await?))
}

/// Create an event organized by the caller.
///
/// # Example
///
/// ```bash
/// curl -X POST http://localhost:3000/api/events \
///   -H "Authorization: Bearer <token>" \
///   -H "Content-Type: application/json" \
///   -d '{
///     "name": "Hack Night",
///     "description": "Overnight build session",
///     "date": "2025-02-01",
///     "time": "18:00:00",
///     "location": "Main Auditorium",
///     "max_participants": 120,
///     "club_id": 3
///   }'
/// ```
///
/// # Errors
///
/// `DATE_NOT_IN_FUTURE`, `NOT_CLUB_MEMBER`, `VALIDATION_ERROR`, or store failures.
pub async fn create_event(
    user: AuthenticatedUser,
    State(state): State<AppState>,
    ApiJson(draft): ApiJson<NewEvent>,
) -> Result<(StatusCode, Json<Event>), AppError> {
    let event = state.service.create_event(user.user_id, draft).await?;
    Ok((StatusCode::CREATED, Json(event)))
}

/// One event with the caller's flags and remaining slots.
///
/// # Errors
///
/// `EVENT_NOT_FOUND` or store failures.
pub async fn get_event(
    user: AuthenticatedUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<EventView>, AppError> {
    let view = state
        .service
        .event_details(EventId::new(id), user.user_id)
        .await?;
    Ok(Json(view))
}

/// Remaining participant and volunteer slots.
///
/// # Errors
///
/// `EVENT_NOT_FOUND` or store failures.
pub async fn get_slots(
    _user: AuthenticatedUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<SlotsResponse>, AppError> {
    let (participants, volunteers) = state.service.slots(EventId::new(id)).await?;
    Ok(Json(SlotsResponse {
        participants,
        volunteers,
    }))
}

/// Participant count. Zero for an unknown event.
///
/// # Errors
///
/// Store failures.
pub async fn participant_count(
    _user: AuthenticatedUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<CountResponse>, AppError> {
    count(&state, EventId::new(id), Role::Participant).await
}

/// Volunteer count. Zero for an unknown event.
///
/// # Errors
///
/// Store failures.
pub async fn volunteer_count(
    _user: AuthenticatedUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<CountResponse>, AppError> {
    count(&state, EventId::new(id), Role::Volunteer).await
}

/// Register the caller as a participant.
///
/// # Errors
///
/// `EVENT_NOT_FOUND`, `ALREADY_REGISTERED`, `CAPACITY_EXCEEDED`, or store failures.
pub async fn join(
    user: AuthenticatedUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<(StatusCode, Json<Registration>), AppError> {
    register(&state, EventId::new(id), user, Role::Participant).await
}

/// Register the caller as a volunteer.
///
/// # Errors
///
/// `EVENT_NOT_FOUND`, `ALREADY_REGISTERED`, `CAPACITY_EXCEEDED`, or store failures.
pub async fn volunteer(
    user: AuthenticatedUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<(StatusCode, Json<Registration>), AppError> {
    register(&state, EventId::new(id), user, Role::Volunteer).await
}

async fn count(
    state: &AppState,
    event_id: EventId,
    role: Role,
) -> Result<Json<CountResponse>, AppError> {
    let count = state.service.registration_count(event_id, role).await?;
    Ok(Json(CountResponse { count }))
}

async fn register(
    state: &AppState,
    event_id: EventId,
    user: AuthenticatedUser,
    role: Role,
) -> Result<(StatusCode, Json<Registration>), AppError> {
    let registration = state.service.register(event_id, user.user_id, role).await?;
    Ok((StatusCode::CREATED, Json(registration)))
}
