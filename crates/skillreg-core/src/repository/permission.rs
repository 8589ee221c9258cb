use std::future::Future;

use skillreg_types::permission::SkillPermission;
use skillreg_types::error::ApiError;
use uuid::Uuid;

/// Grant rows and the read-only org membership lookup permission checks
/// need (§4.9, §9 "organization membership is a separate join").
pub trait PermissionRepository: Send + Sync {
    fn active_grants_for_skill(
        &self,
        skill_id: Uuid,
    ) -> impl Future<Output = Result<Vec<SkillPermission>, ApiError>> + Send;

    /// All accessible private skill ids for a user: owned, org-granted, or
    /// explicitly granted (§4.9, §4.1 "accessibleIds").
    fn accessible_private_ids(
        &self,
        user_id: Uuid,
    ) -> impl Future<Output = Result<Vec<Uuid>, ApiError>> + Send;

    fn is_org_member(
        &self,
        user_id: Uuid,
        org_id: Uuid,
    ) -> impl Future<Output = Result<bool, ApiError>> + Send;
}
