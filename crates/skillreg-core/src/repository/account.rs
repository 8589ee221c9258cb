use std::future::Future;

use skillreg_types::error::ApiError;
use skillreg_types::user::UserAccount;
use uuid::Uuid;

/// Read access to `user_accounts` (§6). Account creation is owned by the
/// out-of-scope OAuth login flow; the device-auth exchange only needs to
/// resolve the username for the token response.
pub trait UserAccountRepository: Send + Sync {
    fn find_by_id(&self, id: Uuid) -> impl Future<Output = Result<Option<UserAccount>, ApiError>> + Send;

    fn upsert(&self, account: &UserAccount) -> impl Future<Output = Result<(), ApiError>> + Send;
}
