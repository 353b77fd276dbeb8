//! Error types for web handlers.
//!
//! [`AppError`] bridges core errors and HTTP responses. Every
//! [`RegistrationError`] kind maps to one status and one stable code so
//! clients can branch on `code` without parsing messages.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use epass_core::RegistrationError;
use serde::Serialize;
use std::fmt;

/// Application error type for web handlers.
///
/// # Examples
///
/// ```ignore
/// async fn handler(State(state): State<AppState>) -> Result<Json<Registration>, AppError> {
///     let registration = state.service.register(event_id, user_id, Role::Participant).await?;
///     Ok(Json(registration))
/// }
/// ```
#[derive(Debug)]
pub struct AppError {
    /// HTTP status code
    status: StatusCode,
    /// Error message (user-facing)
    message: String,
    /// Error code (for client error handling)
    code: &'static str,
    /// Internal error (for logging, not exposed to client)
    source: Option<anyhow::Error>,
}

impl AppError {
    /// Create a new application error.
    #[must_use]
    pub fn new(status: StatusCode, message: impl Into<String>, code: &'static str) -> Self {
        Self {
            status,
            message: message.into(),
            code,
            source: None,
        }
    }

    /// Create a new error with a source error.
    #[must_use]
    pub fn with_source(mut self, source: anyhow::Error) -> Self {
        self.source = Some(source);
        self
    }

    /// Create a 401 Unauthorized error.
    #[must_use]
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message, "UNAUTHORIZED")
    }

    /// Create a 422 Unprocessable Entity error.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, message, "VALIDATION_ERROR")
    }

    /// HTTP status of this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Stable error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        self.code
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

impl From<RegistrationError> for AppError {
    fn from(err: RegistrationError) -> Self {
        let (status, code) = match &err {
            RegistrationError::EventNotFound(_) => (StatusCode::NOT_FOUND, "EVENT_NOT_FOUND"),
            RegistrationError::AlreadyRegistered => (StatusCode::CONFLICT, "ALREADY_REGISTERED"),
            RegistrationError::CapacityExceeded => (StatusCode::CONFLICT, "CAPACITY_EXCEEDED"),
            RegistrationError::NotRegistered => (StatusCode::NOT_FOUND, "NOT_REGISTERED"),
            RegistrationError::AlreadyCheckedIn => (StatusCode::CONFLICT, "ALREADY_CHECKED_IN"),
            RegistrationError::NotClubMember { .. } => (StatusCode::FORBIDDEN, "NOT_CLUB_MEMBER"),
            RegistrationError::DateNotInFuture(_) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "DATE_NOT_IN_FUTURE")
            }
            RegistrationError::InvalidArgument(_) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR")
            }
            RegistrationError::StoreUnavailable(_) => {
                return Self::new(
                    StatusCode::SERVICE_UNAVAILABLE,
                    "Service temporarily unavailable, try again",
                    "TRY_AGAIN",
                )
                .with_source(err.into());
            }
            RegistrationError::Timeout => (StatusCode::GATEWAY_TIMEOUT, "TIMEOUT"),
            RegistrationError::Store(_) => {
                return Self::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal error occurred",
                    "INTERNAL_SERVER_ERROR",
                )
                .with_source(err.into());
            }
        };
        Self::new(status, err.to_string(), code)
    }
}

/// Error response body (JSON).
#[derive(Debug, Serialize)]
struct ErrorResponse {
    /// Error code (for client error handling).
    code: &'static str,
    /// Human-readable error message.
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            if let Some(source) = &self.source {
                tracing::error!(
                    status = %self.status,
                    code = self.code,
                    message = %self.message,
                    error = %source,
                    "Request failed"
                );
            } else {
                tracing::error!(
                    status = %self.status,
                    code = self.code,
                    message = %self.message,
                    "Request failed"
                );
            }
        }

        let body = ErrorResponse {
            code: self.code,
            message: self.message,
        };

        (self.status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use epass_core::{EventId, UserId};

    #[test]
    fn test_error_display() {
        let err = AppError::validation("Invalid USN");
        assert_eq!(err.to_string(), "[VALIDATION_ERROR] Invalid USN");
    }

    #[test]
    fn test_registration_conflicts() {
        let duplicate = AppError::from(RegistrationError::AlreadyRegistered);
        assert_eq!(duplicate.status(), StatusCode::CONFLICT);
        assert_eq!(duplicate.code(), "ALREADY_REGISTERED");

        let full = AppError::from(RegistrationError::CapacityExceeded);
        assert_eq!(full.status(), StatusCode::CONFLICT);
        assert_eq!(full.code(), "CAPACITY_EXCEEDED");
    }

    #[test]
    fn test_check_in_misuse_is_distinguishable() {
        let missing = AppError::from(RegistrationError::NotRegistered);
        let rescanned = AppError::from(RegistrationError::AlreadyCheckedIn);
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
        assert_eq!(rescanned.status(), StatusCode::CONFLICT);
        assert_ne!(missing.code(), rescanned.code());
    }

    #[test]
    fn test_infrastructure_errors_hide_details() {
        let unavailable =
            AppError::from(RegistrationError::StoreUnavailable("pool timed out".into()));
        assert_eq!(unavailable.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(unavailable.code(), "TRY_AGAIN");
        assert!(!unavailable.to_string().contains("pool"));

        let internal = AppError::from(RegistrationError::Store("constraint".into()));
        assert_eq!(internal.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(std::error::Error::source(&internal).is_some());
    }

    #[test]
    fn test_remaining_kinds() {
        let cases = [
            (RegistrationError::EventNotFound(EventId::new(4)), StatusCode::NOT_FOUND),
            (
                RegistrationError::NotClubMember {
                    user_id: UserId::new("1BM21CS001"),
                    club_id: epass_core::ClubId::new(2),
                },
                StatusCode::FORBIDDEN,
            ),
            (RegistrationError::Timeout, StatusCode::GATEWAY_TIMEOUT),
            (
                RegistrationError::InvalidArgument("eid".into()),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(AppError::from(err).status(), status);
        }
    }
}
