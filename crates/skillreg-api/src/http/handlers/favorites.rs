//! `POST /favorites` / `DELETE /favorites` (§4.10). Favoriting requires an
//! authenticated subject; idempotent either way.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use skillreg_core::repository::favorite::FavoriteRepository;
use skillreg_types::error::ApiError;
use skillreg_types::favorite::FavoriteRequest;

use crate::http::error::AppError;
use crate::http::extractors::auth::RequiredAccessor;
use crate::state::AppState;

pub async fn add(
    State(state): State<AppState>,
    RequiredAccessor(accessor): RequiredAccessor,
    Json(body): Json<FavoriteRequest>,
) -> Result<StatusCode, AppError> {
    let user_id = accessor.user_id.ok_or(ApiError::Unauthorized)?;
    state.favorites.add(user_id, body.skill_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn remove(
    State(state): State<AppState>,
    RequiredAccessor(accessor): RequiredAccessor,
    Json(body): Json<FavoriteRequest>,
) -> Result<StatusCode, AppError> {
    let user_id = accessor.user_id.ok_or(ApiError::Unauthorized)?;
    state.favorites.remove(user_id, body.skill_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
