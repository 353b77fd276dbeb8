//! Router configuration.

use crate::handlers::{check_in, events, health_check, me, readiness_check};
use crate::middleware::correlation_id_layer;
use crate::state::AppState;
use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

/// Build the complete Axum router.
///
/// Health checks are public; every `/api` route requires a bearer token.
/// Requests carry a correlation ID and are traced; the correlation layer sits
/// inside `TraceLayer` so handlers log within its span.
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        // Events
        .route("/events", get(events::list_events).post(events::create_event))
        .route("/events/:id", get(events::get_event))
        .route("/events/:id/slots", get(events::get_slots))
        .route("/events/:id/participant-count", get(events::participant_count))
        .route("/events/:id/volunteer-count", get(events::volunteer_count))
        // Registration
        .route("/events/:id/join", post(events::join))
        .route("/events/:id/volunteer", post(events::volunteer))
        // Caller
        .route("/me/registrations", get(me::my_registrations))
        .route("/me/organized", get(me::my_organized_events))
        .route("/me/clubs", get(me::my_clubs))
        // Venue
        .route("/check-in", post(check_in::check_in));

    Router::new()
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        .nest("/api", api_routes)
        .layer(correlation_id_layer())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
