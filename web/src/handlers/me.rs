//! Endpoints scoped to the caller.

use crate::error::AppError;
use crate::extractors::{ApiQuery, AuthenticatedUser};
use crate::state::AppState;
use axum::{Json, extract::State};
use epass_core::{Club, EventDetails, RegisteredEvent, Role};
use serde::Deserialize;

/// Query parameters for listing registrations.
#[derive(Debug, Deserialize)]
pub struct RegistrationsQuery {
    /// Role to list; participant when omitted
    #[serde(default)]
    pub role: Option<Role>,
}

/// `GET /api/me/registrations?role=participant|volunteer`
///
/// # Errors
///
/// `VALIDATION_ERROR` for an unknown role, or store failures.
pub async fn my_registrations(
    user: AuthenticatedUser,
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<RegistrationsQuery>,
) -> Result<Json<Vec<RegisteredEvent>>, AppError> {
    let role = query.role.unwrap_or(Role::Participant);
    Ok(Json(state.service.registrations_for(user.user_id, role).await?))
}

/// `GET /api/me/organized`
///
/// # Errors
///
/// Store failures.
pub async fn my_organized_events(
    user: AuthenticatedUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<EventDetails>>, AppError> {
    Ok(Json(state.service.organized_by(user.user_id).await?))
}

/// `GET /api/me/clubs`
///
/// # Errors
///
/// Store failures.
pub async fn my_clubs(
    user: AuthenticatedUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<Club>>, AppError> {
    Ok(Json(state.service.clubs_for(user.user_id).await?))
}
