//! The authenticated or anonymous principal making a request.

use crate::auth::TokenScope;
use uuid::Uuid;

/// Carries scopes and, for authenticated requests, a user/org identity.
/// Passed through the store's read operations so visibility filtering
/// (§4.9) can be pushed into the query instead of applied after the fact.
#[derive(Debug, Clone, Default)]
pub struct Accessor {
    pub user_id: Option<Uuid>,
    pub org_ids: Vec<Uuid>,
    pub scopes: Vec<TokenScope>,
}

impl Accessor {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn is_anonymous(&self) -> bool {
        self.user_id.is_none()
    }

    pub fn has_scope(&self, scope: TokenScope) -> bool {
        self.scopes.contains(&scope)
    }

    pub fn is_member_of(&self, org_id: Uuid) -> bool {
        self.org_ids.contains(&org_id)
    }
}
