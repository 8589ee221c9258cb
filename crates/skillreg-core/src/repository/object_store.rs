use std::future::Future;

use skillreg_types::error::ApiError;

/// Content-addressed object storage (§4.3 object-store tier). Keys follow
/// the layout in §6: `skills/{owner}/{repo}[/{path}]/SKILL.md`,
/// `skills/{slug}/SKILL.md`, `cache/{trending|top|recent}.json`.
pub trait ObjectStore: Send + Sync {
    fn put(&self, key: &str, bytes: &[u8]) -> impl Future<Output = Result<(), ApiError>> + Send;
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<Vec<u8>>, ApiError>> + Send;
    fn delete(&self, key: &str) -> impl Future<Output = Result<(), ApiError>> + Send;
}
