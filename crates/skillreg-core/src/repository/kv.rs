use std::future::Future;
use std::time::Duration;

use skillreg_types::error::ApiError;

/// Global-scope KV store with TTL semantics (§4.4, §4.7, §5, §4.10). Keys:
/// `github-events:last-event-id`, `github-events:processed:{id}`,
/// `needs_update:{skillId}`, `lock:skill:{id}`,
/// `ratelimit:{subject}:{endpoint}:{window}`.
pub trait KvStore: Send + Sync {
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<String>, ApiError>> + Send;

    fn set(
        &self,
        key: &str,
        value: &str,
        ttl: Option<Duration>,
    ) -> impl Future<Output = Result<(), ApiError>> + Send;

    fn delete(&self, key: &str) -> impl Future<Output = Result<(), ApiError>> + Send;

    fn exists(&self, key: &str) -> impl Future<Output = Result<bool, ApiError>> + Send;

    /// Keys with the given prefix still live (not expired). Used to scan
    /// `needs_update:*` in ranking Phase A.
    fn list_prefix(&self, prefix: &str) -> impl Future<Output = Result<Vec<String>, ApiError>> + Send;

    /// Atomically sets `key` only if absent or expired; returns whether
    /// this call acquired it. Backs `lock:skill:{id}` and
    /// `lock:ranking-run`.
    fn try_acquire_lock(
        &self,
        key: &str,
        ttl: Duration,
    ) -> impl Future<Output = Result<bool, ApiError>> + Send;

    fn release_lock(&self, key: &str) -> impl Future<Output = Result<(), ApiError>> + Send;

    /// Increments a sliding-window counter bucketed by `window`, returning
    /// the post-increment count. Backs the `ratelimit:*` keys.
    fn increment_counter(
        &self,
        key: &str,
        window: Duration,
    ) -> impl Future<Output = Result<u64, ApiError>> + Send;
}
