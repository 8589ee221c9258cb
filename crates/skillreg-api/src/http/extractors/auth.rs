//! Bearer-token authentication extractor (§4.9, §6).
//!
//! Resolves the `Authorization: Bearer <token>` header into an
//! [`Accessor`]. Registry endpoints accept an absent header as an
//! anonymous accessor; a *present but invalid* token is rejected rather
//! than silently downgraded, since a caller presenting a bad token is
//! not the same as one presenting none.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use skillreg_core::repository::auth::AuthRepository;
use skillreg_types::accessor::Accessor;
use skillreg_types::error::{ApiError, AuthError};

use crate::http::error::AppError;
use crate::state::AppState;
use skillreg_infra::crypto::hash::token_hash;

/// `T: FromRequestParts<AppState>` producing an [`Accessor`]; anonymous
/// when no `Authorization` header is present, otherwise the token's
/// subject, scopes are taken from the stored grant.
pub struct AccessorExtractor(pub Accessor);

impl FromRequestParts<AppState> for AccessorExtractor {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Some(token) = bearer_token(parts)? else {
            return Ok(AccessorExtractor(Accessor::anonymous()));
        };
        resolve_token(state, &token).await.map(AccessorExtractor)
    }
}

/// Like [`AccessorExtractor`] but rejects anonymous requests outright,
/// for endpoints that require at least a read-scoped token (non-public
/// downloads).
pub struct RequiredAccessor(pub Accessor);

impl FromRequestParts<AppState> for RequiredAccessor {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Some(token) = bearer_token(parts)? else {
            return Err(AppError::from(ApiError::Unauthorized));
        };
        resolve_token(state, &token).await.map(RequiredAccessor)
    }
}

fn bearer_token(parts: &Parts) -> Result<Option<String>, AppError> {
    let Some(header) = parts.headers.get(axum::http::header::AUTHORIZATION) else {
        return Ok(None);
    };
    let header = header.to_str().map_err(|_| AppError::from(ApiError::Unauthorized))?;
    let token = header.strip_prefix("Bearer ").ok_or_else(|| AppError::from(ApiError::Unauthorized))?;
    Ok(Some(token.trim().to_string()))
}

async fn resolve_token(state: &AppState, token: &str) -> Result<Accessor, AppError> {
    let prefix: String = token.chars().take(12).collect();
    let hash = token_hash(token);

    let stored = state
        .auth
        .find_token_by_prefix(&prefix)
        .await
        .map_err(AppError::from)?
        .ok_or(AppError::from(AuthError::InvalidToken))?;

    let now = chrono::Utc::now();
    let live = stored.revoked_at.is_none() && stored.expires_at.is_none_or(|exp| exp > now);
    if stored.token_hash != hash || !live {
        return Err(AppError::from(AuthError::InvalidToken));
    }

    Ok(Accessor {
        user_id: stored.subject_user_id,
        org_ids: stored.subject_org_id.into_iter().collect(),
        scopes: stored.scopes.clone(),
    })
}
