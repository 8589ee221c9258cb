//! `POST /auth/{init,token,refresh}` (§6): the CLI device-auth token
//! exchange. Session approval/denial itself is driven by the (external,
//! out-of-scope) end-user login page, not this surface.

use axum::extract::State;
use axum::Json;
use chrono::{Duration, Utc};
use skillreg_core::authflow;
use skillreg_core::repository::account::UserAccountRepository;
use skillreg_core::repository::auth::AuthRepository;
use skillreg_types::auth::{
    AuthInitRequest, AuthInitResponse, AuthRefreshRequest, AuthTokenRequest, AuthTokenResponse, AuthUser, TokenScope,
};
use skillreg_types::error::{ApiError, AuthError};

use crate::http::error::AppError;
use crate::state::AppState;

const ACCESS_TOKEN_TTL_SECS: i64 = 3600;
const REFRESH_TOKEN_TTL_SECS: i64 = 30 * 24 * 3600;
const DEFAULT_SCOPES: [TokenScope; 2] = [TokenScope::Read, TokenScope::Write];

pub async fn init(
    State(state): State<AppState>,
    Json(body): Json<AuthInitRequest>,
) -> Result<Json<AuthInitResponse>, AppError> {
    let now = Utc::now();
    let session = authflow::new_session(
        body.callback_url,
        body.state,
        body.code_challenge,
        body.code_challenge_method,
        now,
    );
    let expires_in = (session.expires_at - now).num_seconds().max(0);
    state.auth.create_session(&session).await?;
    Ok(Json(AuthInitResponse { session_id: session.id, expires_in }))
}

pub async fn token(
    State(state): State<AppState>,
    Json(body): Json<AuthTokenRequest>,
) -> Result<Json<AuthTokenResponse>, AppError> {
    let now = Utc::now();
    let mut session = state.auth.find_session(body.session_id).await?.ok_or(AuthError::SessionNotFound)?;
    if session.code != body.code {
        return Err(AppError::from(AuthError::SessionNotFound));
    }

    authflow::exchange(&mut session, body.code_verifier.as_deref(), now).map_err(AppError::from)?;
    state.auth.update_session(&session).await?;

    let user_id = session.user_id.ok_or_else(|| AppError::from(ApiError::Internal("exchanged session has no subject".into())))?;
    let account = state.accounts.find_by_id(user_id).await?.ok_or_else(|| AppError::from(ApiError::Internal("missing user account".into())))?;

    let (access, refresh) = mint_token_pair(&state, Some(user_id), None, now).await?;

    Ok(Json(AuthTokenResponse {
        access_token: access,
        token_type: "Bearer".to_string(),
        expires_in: ACCESS_TOKEN_TTL_SECS,
        refresh_token: refresh,
        refresh_expires_in: REFRESH_TOKEN_TTL_SECS,
        user: AuthUser { id: account.id, username: account.username },
    }))
}

pub async fn refresh(
    State(state): State<AppState>,
    Json(body): Json<AuthRefreshRequest>,
) -> Result<Json<AuthTokenResponse>, AppError> {
    let now = Utc::now();
    let prefix: String = body.refresh_token.chars().take(12).collect();
    let hash = skillreg_infra::crypto::hash::token_hash(&body.refresh_token);

    let stored = state.auth.find_token_by_prefix(&prefix).await?.ok_or(AuthError::InvalidToken)?;
    let live = stored.revoked_at.is_none() && stored.expires_at.is_none_or(|exp| exp > now);
    if stored.token_hash != hash || !live {
        return Err(AppError::from(AuthError::InvalidToken));
    }

    let user_id = stored.subject_user_id.ok_or_else(|| AppError::from(ApiError::Internal("refresh token has no subject".into())))?;
    let account = state.accounts.find_by_id(user_id).await?.ok_or_else(|| AppError::from(ApiError::Internal("missing user account".into())))?;

    state.auth.revoke_token(stored.id).await?;
    let (access, new_refresh) = mint_token_pair(&state, Some(user_id), stored.subject_org_id, now).await?;

    Ok(Json(AuthTokenResponse {
        access_token: access,
        token_type: "Bearer".to_string(),
        expires_in: ACCESS_TOKEN_TTL_SECS,
        refresh_token: new_refresh,
        refresh_expires_in: REFRESH_TOKEN_TTL_SECS,
        user: AuthUser { id: account.id, username: account.username },
    }))
}

async fn mint_token_pair(
    state: &AppState,
    user_id: Option<uuid::Uuid>,
    org_id: Option<uuid::Uuid>,
    now: chrono::DateTime<Utc>,
) -> Result<(String, String), AppError> {
    let (access_plain, access_prefix) = skillreg_infra::crypto::hash::generate_token("at");
    let access = skillreg_types::auth::ApiToken {
        id: uuid::Uuid::new_v4(),
        subject_user_id: user_id,
        subject_org_id: org_id,
        prefix: access_prefix,
        token_hash: skillreg_infra::crypto::hash::token_hash(&access_plain),
        scopes: DEFAULT_SCOPES.to_vec(),
        expires_at: Some(now + Duration::seconds(ACCESS_TOKEN_TTL_SECS)),
        revoked_at: None,
        created_at: now,
    };
    state.auth.create_token(&access).await?;

    let (refresh_plain, refresh_prefix) = skillreg_infra::crypto::hash::generate_token("rt");
    let refresh = skillreg_types::auth::ApiToken {
        id: uuid::Uuid::new_v4(),
        subject_user_id: user_id,
        subject_org_id: org_id,
        prefix: refresh_prefix,
        token_hash: skillreg_infra::crypto::hash::token_hash(&refresh_plain),
        scopes: DEFAULT_SCOPES.to_vec(),
        expires_at: Some(now + Duration::seconds(REFRESH_TOKEN_TTL_SECS)),
        revoked_at: None,
        created_at: now,
    };
    state.auth.create_token(&refresh).await?;

    Ok((access_plain, refresh_plain))
}
