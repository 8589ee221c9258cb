//! Per-skill ACL grants (C9). Visibility itself lives on [`crate::skill::Skill`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum GranteeType {
    User,
    Org,
}

/// An explicit access grant on a private skill.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillPermission {
    pub skill_id: Uuid,
    pub grantee_type: GranteeType,
    pub grantee_id: Uuid,
    pub expires_at: Option<DateTime<Utc>>,
}

impl SkillPermission {
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_none_or(|exp| exp > now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn grant_without_expiry_is_always_active() {
        let g = SkillPermission {
            skill_id: Uuid::nil(),
            grantee_type: GranteeType::User,
            grantee_id: Uuid::nil(),
            expires_at: None,
        };
        assert!(g.is_active(Utc::now()));
    }

    #[test]
    fn expired_grant_is_inactive() {
        let now = Utc::now();
        let g = SkillPermission {
            skill_id: Uuid::nil(),
            grantee_type: GranteeType::User,
            grantee_id: Uuid::nil(),
            expires_at: Some(now - Duration::seconds(1)),
        };
        assert!(!g.is_active(now));
    }
}
