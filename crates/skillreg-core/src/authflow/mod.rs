//! Device Auth (C11): the session state machine and PKCE verification.
//! Token issuance/hashing is an infra concern (needs a CSPRNG + the
//! content hasher); this module owns the pure transitions.

use base64::Engine;
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use skillreg_types::auth::{default_expiry, AuthSession, PkceMethod, SessionState};
use skillreg_types::error::AuthError;
use uuid::Uuid;

/// Creates a new `pending` session with a freshly generated code.
pub fn new_session(
    callback_url: String,
    client_state: Option<String>,
    code_challenge: Option<String>,
    code_challenge_method: Option<PkceMethod>,
    now: DateTime<Utc>,
) -> AuthSession {
    AuthSession {
        id: Uuid::new_v4(),
        state: SessionState::Pending,
        code: Uuid::new_v4().simple().to_string(),
        callback_url,
        client_state,
        code_challenge,
        code_challenge_method,
        user_id: None,
        created_at: now,
        expires_at: default_expiry(now),
    }
}

fn state_error(state: SessionState) -> AuthError {
    match state {
        SessionState::Expired => AuthError::Expired,
        SessionState::Exchanged => AuthError::AlreadyExchanged,
        _ => AuthError::NotPending,
    }
}

/// `pending --(user approves)--> approved`.
pub fn approve(session: &mut AuthSession, user_id: Uuid, now: DateTime<Utc>) -> Result<(), AuthError> {
    match session.effective_state(now) {
        SessionState::Pending => {
            session.state = SessionState::Approved;
            session.user_id = Some(user_id);
            Ok(())
        }
        other => Err(state_error(other)),
    }
}

/// `pending --(user denies)--> denied`.
pub fn deny(session: &mut AuthSession, now: DateTime<Utc>) -> Result<(), AuthError> {
    match session.effective_state(now) {
        SessionState::Pending => {
            session.state = SessionState::Denied;
            Ok(())
        }
        other => Err(state_error(other)),
    }
}

/// `approved --(token exchange)--> exchanged`, at most once. Validates the
/// PKCE verifier against the stored challenge when one was set at init.
pub fn exchange(session: &mut AuthSession, code_verifier: Option<&str>, now: DateTime<Utc>) -> Result<(), AuthError> {
    match session.effective_state(now) {
        SessionState::Approved => {
            verify_pkce(
                session.code_challenge_method,
                session.code_challenge.as_deref(),
                code_verifier,
            )?;
            session.state = SessionState::Exchanged;
            Ok(())
        }
        other => Err(state_error(other)),
    }
}

/// Verifies a PKCE verifier against a stored challenge (RFC 7636). `S256`
/// hashes the verifier and compares against the base64url (no padding)
/// encoding; `plain` compares directly. No challenge configured means
/// PKCE was not requested at init, so verification trivially passes.
pub fn verify_pkce(
    method: Option<PkceMethod>,
    challenge: Option<&str>,
    verifier: Option<&str>,
) -> Result<(), AuthError> {
    let Some(challenge) = challenge else {
        return Ok(());
    };
    let verifier = verifier.ok_or(AuthError::PkceMismatch)?;

    let computed = match method.unwrap_or(PkceMethod::S256) {
        PkceMethod::Plain => verifier.to_string(),
        PkceMethod::S256 => {
            let digest = Sha256::digest(verifier.as_bytes());
            base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(digest)
        }
    };

    if computed == challenge {
        Ok(())
    } else {
        Err(AuthError::PkceMismatch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn happy_path_linearity() {
        let now = Utc::now();
        let mut session = new_session("https://cli.example/callback".into(), None, None, None, now);
        approve(&mut session, Uuid::new_v4(), now).expect("approve");
        exchange(&mut session, None, now).expect("exchange once");
        assert_eq!(session.state, SessionState::Exchanged);
    }

    #[test]
    fn code_cannot_be_exchanged_twice() {
        let now = Utc::now();
        let mut session = new_session("https://cli.example/callback".into(), None, None, None, now);
        approve(&mut session, Uuid::new_v4(), now).expect("approve");
        exchange(&mut session, None, now).expect("first exchange");
        let second = exchange(&mut session, None, now);
        assert_eq!(second, Err(AuthError::AlreadyExchanged));
    }

    #[test]
    fn pending_session_expires_after_ttl() {
        let created = Utc::now() - Duration::minutes(6);
        let mut session = new_session("https://cli.example/callback".into(), None, None, None, created);
        let now = created + Duration::minutes(6);
        let result = approve(&mut session, Uuid::new_v4(), now);
        assert_eq!(result, Err(AuthError::Expired));
    }

    #[test]
    fn only_pending_accepts_deny() {
        let now = Utc::now();
        let mut session = new_session("https://cli.example/callback".into(), None, None, None, now);
        approve(&mut session, Uuid::new_v4(), now).expect("approve");
        let result = deny(&mut session, now);
        assert_eq!(result, Err(AuthError::NotPending));
    }

    #[test]
    fn pkce_s256_round_trip() {
        let verifier = "test-verifier-string-1234567890";
        let digest = Sha256::digest(verifier.as_bytes());
        let challenge = base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(digest);
        assert!(verify_pkce(Some(PkceMethod::S256), Some(&challenge), Some(verifier)).is_ok());
    }

    #[test]
    fn pkce_mismatch_fails_exchange() {
        let now = Utc::now();
        let mut session = new_session(
            "https://cli.example/callback".into(),
            None,
            Some("expected-challenge".into()),
            Some(PkceMethod::Plain),
            now,
        );
        approve(&mut session, Uuid::new_v4(), now).expect("approve");
        let result = exchange(&mut session, Some("wrong-verifier"), now);
        assert_eq!(result, Err(AuthError::PkceMismatch));
    }
}
