use std::future::Future;

use skillreg_types::error::ApiError;
use uuid::Uuid;

pub trait FavoriteRepository: Send + Sync {
    /// Idempotent: adding an existing favorite or removing a missing one
    /// both succeed without error (§4.10).
    fn add(&self, user_id: Uuid, skill_id: Uuid) -> impl Future<Output = Result<(), ApiError>> + Send;
    fn remove(&self, user_id: Uuid, skill_id: Uuid) -> impl Future<Output = Result<(), ApiError>> + Send;
    fn is_favorited(
        &self,
        user_id: Uuid,
        skill_id: Uuid,
    ) -> impl Future<Output = Result<bool, ApiError>> + Send;
}
