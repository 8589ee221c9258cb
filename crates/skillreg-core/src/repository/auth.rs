use std::future::Future;

use skillreg_types::auth::{ApiToken, AuthSession};
use skillreg_types::error::ApiError;
use uuid::Uuid;

pub trait AuthRepository: Send + Sync {
    fn create_session(&self, session: &AuthSession) -> impl Future<Output = Result<(), ApiError>> + Send;
    fn find_session(&self, id: Uuid) -> impl Future<Output = Result<Option<AuthSession>, ApiError>> + Send;
    fn find_session_by_code(
        &self,
        code: &str,
    ) -> impl Future<Output = Result<Option<AuthSession>, ApiError>> + Send;
    fn update_session(&self, session: &AuthSession) -> impl Future<Output = Result<(), ApiError>> + Send;

    fn create_token(&self, token: &ApiToken) -> impl Future<Output = Result<(), ApiError>> + Send;
    fn find_token_by_prefix(
        &self,
        prefix: &str,
    ) -> impl Future<Output = Result<Option<ApiToken>, ApiError>> + Send;
    fn revoke_token(&self, id: Uuid) -> impl Future<Output = Result<(), ApiError>> + Send;
}
