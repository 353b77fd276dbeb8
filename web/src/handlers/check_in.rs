//! Venue check-in.
//!
//! `POST /api/check-in` accepts either the decoded ticket fields or the raw
//! scanned payload:
//!
//! ```json
//! { "usn": "1BM21CS001", "event_id": 7 }
//! { "payload": "https://epass.example/ticket?usn=1BM21CS001&eid=7" }
//! ```

use crate::error::AppError;
use crate::extractors::{ApiJson, AuthenticatedUser, CorrelationId};
use crate::state::AppState;
use crate::validation::parse_usn;
use axum::{Json, extract::State};
use epass_core::{EventId, Registration, TicketCode};
use serde::Deserialize;

/// Check-in request body.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum CheckInRequest {
    /// Raw QR payload
    Ticket {
        /// Scanned text
        payload: String,
    },
    /// Decoded ticket fields
    Direct {
        /// Participant USN
        usn: String,
        /// Event identifier
        event_id: EventId,
    },
}

/// Mark a participant as attended.
///
/// # Errors
///
/// `VALIDATION_ERROR` for an unreadable ticket or malformed USN,
/// `NOT_REGISTERED`, `ALREADY_CHECKED_IN`, or store failures.
pub async fn check_in(
    staff: AuthenticatedUser,
    correlation_id: CorrelationId,
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CheckInRequest>,
) -> Result<Json<Registration>, AppError> {
    let (user_id, event_id) = match request {
        CheckInRequest::Ticket { payload } => {
            let ticket = TicketCode::parse(&payload)?;
            (parse_usn(ticket.user_id.as_str())?, ticket.event_id)
        }
        CheckInRequest::Direct { usn, event_id } => (parse_usn(&usn)?, event_id),
    };

    tracing::info!(
        correlation_id = %correlation_id.0,
        staff = %staff.user_id,
        user_id = %user_id,
        event_id = %event_id,
        "Ticket scanned"
    );

    Ok(Json(state.service.check_in(user_id, event_id).await?))
}
