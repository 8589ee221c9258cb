//! SQLite-backed `AuthRepository`: device-auth sessions (C11) and bearer
//! API tokens (§4.11).

use chrono::{DateTime, Utc};
use skillreg_core::repository::auth::AuthRepository;
use skillreg_types::auth::{ApiToken, AuthSession, PkceMethod, SessionState, TokenScope};
use skillreg_types::error::ApiError;
use sqlx::Row;
use uuid::Uuid;

use super::pool::DatabasePool;

pub struct SqliteAuthRepository {
    pool: DatabasePool,
}

impl SqliteAuthRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

fn session_state_to_str(s: SessionState) -> &'static str {
    match s {
        SessionState::Pending => "pending",
        SessionState::Approved => "approved",
        SessionState::Denied => "denied",
        SessionState::Exchanged => "exchanged",
        SessionState::Expired => "expired",
    }
}

fn session_state_from_str(s: &str) -> Result<SessionState, ApiError> {
    match s {
        "pending" => Ok(SessionState::Pending),
        "approved" => Ok(SessionState::Approved),
        "denied" => Ok(SessionState::Denied),
        "exchanged" => Ok(SessionState::Exchanged),
        "expired" => Ok(SessionState::Expired),
        other => Err(ApiError::Internal(format!("unknown session state: {other}"))),
    }
}

fn pkce_method_to_str(m: PkceMethod) -> &'static str {
    match m {
        PkceMethod::S256 => "S256",
        PkceMethod::Plain => "PLAIN",
    }
}

fn pkce_method_from_str(s: &str) -> Result<PkceMethod, ApiError> {
    match s {
        "S256" => Ok(PkceMethod::S256),
        "PLAIN" => Ok(PkceMethod::Plain),
        other => Err(ApiError::Internal(format!("unknown pkce method: {other}"))),
    }
}

fn token_scope_to_str(s: TokenScope) -> &'static str {
    match s {
        TokenScope::Read => "read",
        TokenScope::Write => "write",
        TokenScope::Publish => "publish",
    }
}

fn token_scope_from_str(s: &str) -> Result<TokenScope, ApiError> {
    match s {
        "read" => Ok(TokenScope::Read),
        "write" => Ok(TokenScope::Write),
        "publish" => Ok(TokenScope::Publish),
        other => Err(ApiError::Internal(format!("unknown token scope: {other}"))),
    }
}

fn parse_datetime(s: &str) -> Result<DateTime<Utc>, ApiError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| ApiError::Internal(format!("invalid datetime: {e}")))
}

fn row_to_session(row: &sqlx::sqlite::SqliteRow) -> Result<AuthSession, ApiError> {
    let id: String = row.try_get("id").map_err(|e| ApiError::Internal(e.to_string()))?;
    let state: String = row.try_get("state").map_err(|e| ApiError::Internal(e.to_string()))?;
    let code_challenge_method: Option<String> =
        row.try_get("code_challenge_method").map_err(|e| ApiError::Internal(e.to_string()))?;
    let user_id: Option<String> = row.try_get("user_id").map_err(|e| ApiError::Internal(e.to_string()))?;
    let created_at: String = row.try_get("created_at").map_err(|e| ApiError::Internal(e.to_string()))?;
    let expires_at: String = row.try_get("expires_at").map_err(|e| ApiError::Internal(e.to_string()))?;

    Ok(AuthSession {
        id: Uuid::parse_str(&id).map_err(|e| ApiError::Internal(e.to_string()))?,
        state: session_state_from_str(&state)?,
        code: row.try_get("code").map_err(|e| ApiError::Internal(e.to_string()))?,
        callback_url: row.try_get("callback_url").map_err(|e| ApiError::Internal(e.to_string()))?,
        client_state: row.try_get("client_state").map_err(|e| ApiError::Internal(e.to_string()))?,
        code_challenge: row.try_get("code_challenge").map_err(|e| ApiError::Internal(e.to_string()))?,
        code_challenge_method: code_challenge_method.as_deref().map(pkce_method_from_str).transpose()?,
        user_id: user_id.as_deref().map(Uuid::parse_str).transpose().map_err(|e| ApiError::Internal(e.to_string()))?,
        created_at: parse_datetime(&created_at)?,
        expires_at: parse_datetime(&expires_at)?,
    })
}

fn row_to_token(row: &sqlx::sqlite::SqliteRow) -> Result<ApiToken, ApiError> {
    let id: String = row.try_get("id").map_err(|e| ApiError::Internal(e.to_string()))?;
    let subject_user_id: Option<String> = row.try_get("subject_user_id").map_err(|e| ApiError::Internal(e.to_string()))?;
    let subject_org_id: Option<String> = row.try_get("subject_org_id").map_err(|e| ApiError::Internal(e.to_string()))?;
    let scopes: String = row.try_get("scopes").map_err(|e| ApiError::Internal(e.to_string()))?;
    let expires_at: Option<String> = row.try_get("expires_at").map_err(|e| ApiError::Internal(e.to_string()))?;
    let revoked_at: Option<String> = row.try_get("revoked_at").map_err(|e| ApiError::Internal(e.to_string()))?;
    let created_at: String = row.try_get("created_at").map_err(|e| ApiError::Internal(e.to_string()))?;

    let scope_strs: Vec<String> = serde_json::from_str(&scopes).map_err(|e| ApiError::Internal(e.to_string()))?;
    let scopes = scope_strs.iter().map(|s| token_scope_from_str(s)).collect::<Result<Vec<_>, _>>()?;

    Ok(ApiToken {
        id: Uuid::parse_str(&id).map_err(|e| ApiError::Internal(e.to_string()))?,
        subject_user_id: subject_user_id.as_deref().map(Uuid::parse_str).transpose().map_err(|e| ApiError::Internal(e.to_string()))?,
        subject_org_id: subject_org_id.as_deref().map(Uuid::parse_str).transpose().map_err(|e| ApiError::Internal(e.to_string()))?,
        prefix: row.try_get("prefix").map_err(|e| ApiError::Internal(e.to_string()))?,
        token_hash: row.try_get("token_hash").map_err(|e| ApiError::Internal(e.to_string()))?,
        scopes,
        expires_at: expires_at.as_deref().map(parse_datetime).transpose()?,
        revoked_at: revoked_at.as_deref().map(parse_datetime).transpose()?,
        created_at: parse_datetime(&created_at)?,
    })
}

impl AuthRepository for SqliteAuthRepository {
    async fn create_session(&self, session: &AuthSession) -> Result<(), ApiError> {
        sqlx::query(
            "INSERT INTO cli_auth_sessions (id, state, code, callback_url, client_state, code_challenge,
                code_challenge_method, user_id, created_at, expires_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(session.id.to_string())
        .bind(session_state_to_str(session.state))
        .bind(&session.code)
        .bind(&session.callback_url)
        .bind(&session.client_state)
        .bind(&session.code_challenge)
        .bind(session.code_challenge_method.map(pkce_method_to_str))
        .bind(session.user_id.map(|u| u.to_string()))
        .bind(session.created_at.to_rfc3339())
        .bind(session.expires_at.to_rfc3339())
        .execute(&self.pool.writer)
        .await
        .map_err(|e| ApiError::Transient(e.to_string()))?;
        Ok(())
    }

    async fn find_session(&self, id: Uuid) -> Result<Option<AuthSession>, ApiError> {
        let row = sqlx::query("SELECT * FROM cli_auth_sessions WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(|e| ApiError::Transient(e.to_string()))?;
        row.as_ref().map(row_to_session).transpose()
    }

    async fn find_session_by_code(&self, code: &str) -> Result<Option<AuthSession>, ApiError> {
        let row = sqlx::query("SELECT * FROM cli_auth_sessions WHERE code = ?")
            .bind(code)
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(|e| ApiError::Transient(e.to_string()))?;
        row.as_ref().map(row_to_session).transpose()
    }

    async fn update_session(&self, session: &AuthSession) -> Result<(), ApiError> {
        let result = sqlx::query("UPDATE cli_auth_sessions SET state = ?, user_id = ? WHERE id = ?")
            .bind(session_state_to_str(session.state))
            .bind(session.user_id.map(|u| u.to_string()))
            .bind(session.id.to_string())
            .execute(&self.pool.writer)
            .await
            .map_err(|e| ApiError::Transient(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(ApiError::NotFound);
        }
        Ok(())
    }

    async fn create_token(&self, token: &ApiToken) -> Result<(), ApiError> {
        let scopes = serde_json::to_string(
            &token.scopes.iter().map(|s| token_scope_to_str(*s)).collect::<Vec<_>>(),
        )
        .map_err(|e| ApiError::Internal(e.to_string()))?;

        sqlx::query(
            "INSERT INTO api_tokens (id, subject_user_id, subject_org_id, prefix, token_hash, scopes,
                expires_at, revoked_at, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(token.id.to_string())
        .bind(token.subject_user_id.map(|u| u.to_string()))
        .bind(token.subject_org_id.map(|u| u.to_string()))
        .bind(&token.prefix)
        .bind(&token.token_hash)
        .bind(scopes)
        .bind(token.expires_at.map(|d| d.to_rfc3339()))
        .bind(token.revoked_at.map(|d| d.to_rfc3339()))
        .bind(token.created_at.to_rfc3339())
        .execute(&self.pool.writer)
        .await
        .map_err(|e| ApiError::Transient(e.to_string()))?;
        Ok(())
    }

    async fn find_token_by_prefix(&self, prefix: &str) -> Result<Option<ApiToken>, ApiError> {
        let row = sqlx::query("SELECT * FROM api_tokens WHERE prefix = ?")
            .bind(prefix)
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(|e| ApiError::Transient(e.to_string()))?;
        row.as_ref().map(row_to_token).transpose()
    }

    async fn revoke_token(&self, id: Uuid) -> Result<(), ApiError> {
        let result = sqlx::query("UPDATE api_tokens SET revoked_at = ? WHERE id = ?")
            .bind(Utc::now().to_rfc3339())
            .bind(id.to_string())
            .execute(&self.pool.writer)
            .await
            .map_err(|e| ApiError::Transient(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(ApiError::NotFound);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_pool() -> DatabasePool {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let url = format!("sqlite://{}?mode=rwc", db_path.display());
        std::mem::forget(dir);
        DatabasePool::new(&url).await.unwrap()
    }

    fn make_session() -> AuthSession {
        let now = Utc::now();
        AuthSession {
            id: Uuid::new_v4(),
            state: SessionState::Pending,
            code: "abc123".into(),
            callback_url: "https://cli.example.com/callback".into(),
            client_state: None,
            code_challenge: Some("challenge".into()),
            code_challenge_method: Some(PkceMethod::S256),
            user_id: None,
            created_at: now,
            expires_at: now + chrono::Duration::minutes(5),
        }
    }

    #[tokio::test]
    async fn create_then_find_session_by_code() {
        let repo = SqliteAuthRepository::new(test_pool().await);
        let session = make_session();
        repo.create_session(&session).await.unwrap();

        let found = repo.find_session_by_code(&session.code).await.unwrap().unwrap();
        assert_eq!(found.id, session.id);
        assert_eq!(found.state, SessionState::Pending);
    }

    #[tokio::test]
    async fn update_session_persists_state_transition() {
        let repo = SqliteAuthRepository::new(test_pool().await);
        let mut session = make_session();
        repo.create_session(&session).await.unwrap();

        session.state = SessionState::Approved;
        session.user_id = Some(Uuid::new_v4());
        repo.update_session(&session).await.unwrap();

        let found = repo.find_session(session.id).await.unwrap().unwrap();
        assert_eq!(found.state, SessionState::Approved);
        assert_eq!(found.user_id, session.user_id);
    }

    #[tokio::test]
    async fn token_roundtrip_and_revoke() {
        let repo = SqliteAuthRepository::new(test_pool().await);
        let now = Utc::now();
        let token = ApiToken {
            id: Uuid::new_v4(),
            subject_user_id: Some(Uuid::new_v4()),
            subject_org_id: None,
            prefix: "sk_abcd1234".into(),
            token_hash: "deadbeef".into(),
            scopes: vec![TokenScope::Read, TokenScope::Write],
            expires_at: None,
            revoked_at: None,
            created_at: now,
        };
        repo.create_token(&token).await.unwrap();

        let found = repo.find_token_by_prefix(&token.prefix).await.unwrap().unwrap();
        assert_eq!(found.scopes, vec![TokenScope::Read, TokenScope::Write]);
        assert!(found.is_valid(now, TokenScope::Read));

        repo.revoke_token(token.id).await.unwrap();
        let found = repo.find_token_by_prefix(&token.prefix).await.unwrap().unwrap();
        assert!(!found.is_valid(now, TokenScope::Read));
    }
}
