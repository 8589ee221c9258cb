//! Device-auth session state machine (C11) and bearer API tokens.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Session lifetime before it is considered expired (§4.9).
pub const SESSION_TTL_MINUTES: i64 = 5;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Pending,
    Approved,
    Denied,
    Exchanged,
    Expired,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum PkceMethod {
    S256,
    Plain,
}

/// A device-auth session row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSession {
    pub id: Uuid,
    pub state: SessionState,
    pub code: String,
    pub callback_url: String,
    pub client_state: Option<String>,
    pub code_challenge: Option<String>,
    pub code_challenge_method: Option<PkceMethod>,
    pub user_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl AuthSession {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    pub fn effective_state(&self, now: DateTime<Utc>) -> SessionState {
        if matches!(self.state, SessionState::Pending | SessionState::Approved) && self.is_expired(now) {
            SessionState::Expired
        } else {
            self.state
        }
    }
}

pub fn default_expiry(created_at: DateTime<Utc>) -> DateTime<Utc> {
    created_at + Duration::minutes(SESSION_TTL_MINUTES)
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TokenScope {
    Read,
    Write,
    Publish,
}

/// An issued bearer token, hashed at rest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiToken {
    pub id: Uuid,
    pub subject_user_id: Option<Uuid>,
    pub subject_org_id: Option<Uuid>,
    pub prefix: String,
    pub token_hash: String,
    pub scopes: Vec<TokenScope>,
    pub expires_at: Option<DateTime<Utc>>,
    pub revoked_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl ApiToken {
    pub fn is_valid(&self, now: DateTime<Utc>, required: TokenScope) -> bool {
        self.revoked_at.is_none()
            && self.expires_at.is_none_or(|exp| exp > now)
            && self.scopes.contains(&required)
    }
}

// --- wire types (§6) ---

#[derive(Debug, Clone, Deserialize)]
pub struct AuthInitRequest {
    pub callback_url: String,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub client_info: Option<String>,
    #[serde(default)]
    pub code_challenge: Option<String>,
    #[serde(default)]
    pub code_challenge_method: Option<PkceMethod>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AuthInitResponse {
    pub session_id: Uuid,
    pub expires_in: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthTokenRequest {
    pub code: String,
    pub session_id: Uuid,
    #[serde(default)]
    pub code_verifier: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AuthTokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub refresh_token: String,
    pub refresh_expires_in: i64,
    pub user: AuthUser,
}

#[derive(Debug, Clone, Serialize)]
pub struct AuthUser {
    pub id: Uuid,
    pub username: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthRefreshRequest {
    pub refresh_token: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_session_expires_after_ttl() {
        let now = Utc::now();
        let s = AuthSession {
            id: Uuid::nil(),
            state: SessionState::Pending,
            code: "c".into(),
            callback_url: "https://example.com".into(),
            client_state: None,
            code_challenge: None,
            code_challenge_method: None,
            user_id: None,
            created_at: now - Duration::minutes(6),
            expires_at: default_expiry(now - Duration::minutes(6)),
        };
        assert_eq!(s.effective_state(now), SessionState::Expired);
    }

    #[test]
    fn exchanged_state_is_not_overridden_by_expiry() {
        let now = Utc::now();
        let s = AuthSession {
            id: Uuid::nil(),
            state: SessionState::Exchanged,
            code: "c".into(),
            callback_url: "https://example.com".into(),
            client_state: None,
            code_challenge: None,
            code_challenge_method: None,
            user_id: None,
            created_at: now - Duration::minutes(100),
            expires_at: now - Duration::minutes(95),
        };
        assert_eq!(s.effective_state(now), SessionState::Exchanged);
    }
}
