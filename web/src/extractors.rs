//! Custom Axum extractors.
//!
//! - [`CorrelationId`]: the request's correlation ID
//! - [`BearerToken`]: raw token from `Authorization: Bearer <token>`
//! - [`AuthenticatedUser`]: the user the token resolves to
//! - [`ApiJson`] / [`ApiQuery`]: `Json` and `Query` whose rejections are
//!   [`AppError`] bodies
//!
//! # Examples
//!
//! ```ignore
//! async fn handler(
//!     user: AuthenticatedUser,
//!     correlation_id: CorrelationId,
//! ) -> Result<Json<Vec<EventView>>, AppError> {
//!     tracing::info!(
//!         correlation_id = %correlation_id.0,
//!         user_id = %user.user_id,
//!         "Listing events"
//!     );
//!     ...
//! }
//! ```

use crate::error::AppError;
use crate::middleware::correlation_id_from;
use crate::state::AppState;
use axum::{
    Json, async_trait,
    extract::{
        FromRequest, FromRequestParts, Query, Request,
        rejection::{JsonRejection, QueryRejection},
    },
    http::{StatusCode, request::Parts},
};
use epass_core::{RegistrationError, UserId};
use serde::de::DeserializeOwned;
use uuid::Uuid;

/// Correlation ID for request tracing.
///
/// Reads the ID the correlation middleware stored in request extensions,
/// then the `X-Correlation-ID` header, and generates a UUID v4 if neither is
/// present.
#[derive(Debug, Clone, Copy)]
pub struct CorrelationId(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for CorrelationId
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if let Some(id) = parts.extensions.get::<Uuid>() {
            return Ok(Self(*id));
        }

        Ok(Self(
            correlation_id_from(&parts.headers).unwrap_or_else(Uuid::new_v4),
        ))
    }
}

/// Bearer token extracted from `Authorization: Bearer <token>` header.
#[derive(Debug, Clone)]
pub struct BearerToken(pub String);

#[async_trait]
impl<S> FromRequestParts<S> for BearerToken
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get("authorization")
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::unauthorized("Missing authorization header"))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or_else(|| {
                AppError::unauthorized("Invalid authorization format. Expected 'Bearer <token>'")
            })?
            .trim();

        if token.is_empty() {
            return Err(AppError::unauthorized("Empty bearer token"));
        }

        Ok(Self(token.to_string()))
    }
}

/// Authenticated user.
///
/// Resolves the bearer token through the state's identity provider. Use this
/// as a handler parameter to require authentication; the user ID is then
/// passed explicitly into each core operation.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    /// The authenticated user ID
    pub user_id: UserId,
}

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let BearerToken(token) = BearerToken::from_request_parts(parts, state).await?;

        match state.identity.authenticate(&token).await {
            Ok(Some(user_id)) => {
                tracing::Span::current().record("user_id", user_id.as_str());
                Ok(Self { user_id })
            }
            Ok(None) => Err(AppError::unauthorized("Invalid or expired session")),
            Err(err) => Err(RegistrationError::from(err).into()),
        }
    }
}

/// JSON body extractor that rejects with a `VALIDATION_ERROR` body.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(json_rejection(&rejection)),
        }
    }
}

/// Query string extractor that rejects with a `VALIDATION_ERROR` body.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiQuery<T>(pub T);

#[async_trait]
impl<T, S> FromRequestParts<S> for ApiQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Query::<T>::from_request_parts(parts, state).await {
            Ok(Query(value)) => Ok(Self(value)),
            Err(rejection) => Err(query_rejection(&rejection)),
        }
    }
}

// Unreadable or mistyped input is a validation failure; transport-level
// problems (content type, body size) keep axum's status.
fn json_rejection(rejection: &JsonRejection) -> AppError {
    match rejection.status() {
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
            AppError::validation(rejection.body_text())
        }
        StatusCode::UNSUPPORTED_MEDIA_TYPE => AppError::new(
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            rejection.body_text(),
            "UNSUPPORTED_MEDIA_TYPE",
        ),
        status => AppError::new(status, rejection.body_text(), "INVALID_REQUEST"),
    }
}

fn query_rejection(rejection: &QueryRejection) -> AppError {
    AppError::validation(rejection.body_text())
}
