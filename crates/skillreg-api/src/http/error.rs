//! Maps the domain error taxonomy onto the read API's error envelope
//! (§7): `NotFound`/`Unauthorized`/`Forbidden` surface directly, every
//! other kind collapses to `500` with `{error: "<short>"}`. Internal
//! detail is logged, never returned to the caller.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use skillreg_types::error::{ApiError, AuthError, PermissionError};
use tracing::error;
use uuid::Uuid;

#[derive(Debug)]
pub enum AppError {
    Api(ApiError),
    Auth(AuthError),
    Permission(PermissionError),
}

impl From<ApiError> for AppError {
    fn from(e: ApiError) -> Self {
        AppError::Api(e)
    }
}

impl From<AuthError> for AppError {
    fn from(e: AuthError) -> Self {
        AppError::Auth(e)
    }
}

impl From<PermissionError> for AppError {
    fn from(e: PermissionError) -> Self {
        AppError::Permission(e)
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let correlation_id = Uuid::new_v4();

        let (status, message): (StatusCode, &'static str) = match &self {
            AppError::Api(ApiError::NotFound) => (StatusCode::NOT_FOUND, "not found"),
            AppError::Api(ApiError::Unauthorized) => (StatusCode::UNAUTHORIZED, "unauthorized"),
            AppError::Api(ApiError::Forbidden) => (StatusCode::FORBIDDEN, "forbidden"),
            AppError::Permission(PermissionError::NotFound) => (StatusCode::NOT_FOUND, "not found"),
            AppError::Permission(PermissionError::Denied) => (StatusCode::FORBIDDEN, "forbidden"),
            AppError::Auth(AuthError::SessionNotFound) => (StatusCode::NOT_FOUND, "not found"),
            AppError::Auth(AuthError::InvalidToken) => (StatusCode::UNAUTHORIZED, "unauthorized"),
            // Everything else -- validation, conflicts, upstream/transient
            // failures, and any other auth-flow state error -- collapses
            // to a flat 500 per §7's propagation policy.
            other => {
                error!(%correlation_id, error = ?other, "internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal error")
            }
        };

        (status, Json(ErrorBody { error: message.to_string() })).into_response()
    }
}
