//! Domain error taxonomy.
//!
//! One `thiserror` enum per area, plus the common [`ApiError`] kinds from
//! the error-handling design: `Validation`, `NotFound`, `Unauthorized`,
//! `Forbidden`, `Conflict`, `RateLimited`, `UpstreamUnavailable`,
//! `Transient`, `Internal`.

use thiserror::Error;

/// The common error kind surfaced by the read API and by workers deciding
/// whether to retry.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("not found")]
    NotFound,
    #[error("unauthorized")]
    Unauthorized,
    #[error("forbidden")]
    Forbidden,
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("rate limited, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },
    #[error("upstream unavailable: {0}")]
    UpstreamUnavailable(String),
    #[error("transient error: {0}")]
    Transient(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// Whether a caller may retry this failure without changing anything.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ApiError::Transient(_) | ApiError::UpstreamUnavailable(_) | ApiError::RateLimited { .. }
        )
    }
}

/// Errors from C5, the indexing worker.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("repository not found")]
    RepoNotFound,
    #[error("source host error: {0}")]
    SourceHost(#[from] SourceHostError),
    #[error("invalid frontmatter: {0}")]
    InvalidFrontmatter(String),
    #[error("store error: {0}")]
    Store(String),
    #[error("object store error: {0}")]
    ObjectStore(String),
}

/// Errors from C2, the source-host client.
#[derive(Debug, Error)]
pub enum SourceHostError {
    #[error("rate limited, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },
    #[error("transient http status {0}")]
    Transient(u16),
    #[error("non-retryable http status {0}")]
    Http(u16),
    #[error("network error: {0}")]
    Network(String),
    #[error("exhausted {0} retry attempts")]
    RetriesExhausted(u32),
}

/// Errors from C6, the classification worker.
#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error("store error: {0}")]
    Store(String),
    #[error("suggestion provider error: {0}")]
    Suggester(String),
}

/// Errors from C7, the ranking engine.
#[derive(Debug, Error)]
pub enum RankingError {
    #[error("store error: {0}")]
    Store(String),
    #[error("source host error: {0}")]
    SourceHost(#[from] SourceHostError),
    #[error("a ranking run is already in progress")]
    AlreadyRunning,
}

/// Errors from C8, the lifecycle manager.
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("store error: {0}")]
    Store(String),
    #[error("source host error: {0}")]
    SourceHost(#[from] SourceHostError),
}

/// Errors from C9, the permission layer.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PermissionError {
    #[error("skill is private and the accessor has no grant")]
    Denied,
    #[error("skill not found")]
    NotFound,
}

/// Errors from C11, the device-auth flow.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("session not found")]
    SessionNotFound,
    #[error("session is not pending")]
    NotPending,
    #[error("session is not approved")]
    NotApproved,
    #[error("session has expired")]
    Expired,
    #[error("code was already exchanged")]
    AlreadyExchanged,
    #[error("pkce verifier does not match challenge")]
    PkceMismatch,
    #[error("token invalid or revoked")]
    InvalidToken,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_error_display() {
        assert_eq!(ApiError::NotFound.to_string(), "not found");
        assert_eq!(
            ApiError::RateLimited { retry_after_secs: 2 }.to_string(),
            "rate limited, retry after 2s"
        );
    }

    #[test]
    fn retryable_kinds() {
        assert!(ApiError::Transient("x".into()).is_retryable());
        assert!(ApiError::UpstreamUnavailable("x".into()).is_retryable());
        assert!(!ApiError::Validation("x".into()).is_retryable());
        assert!(!ApiError::NotFound.is_retryable());
    }

    #[test]
    fn auth_error_display() {
        assert_eq!(AuthError::Expired.to_string(), "session has expired");
    }
}
