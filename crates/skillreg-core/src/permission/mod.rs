//! Permissions (C9): visibility rules and per-skill ACL checks. Pure
//! functions over already-resolved facts (org membership, active grants)
//! -- the async repository lookups happen at the call site.

use chrono::{DateTime, Utc};
use skillreg_types::accessor::Accessor;
use skillreg_types::permission::SkillPermission;
use skillreg_types::skill::{Skill, Visibility};

/// Whether `accessor` may read this skill at all (detail/download
/// endpoints, §4.9).
pub fn can_access(
    skill: &Skill,
    accessor: &Accessor,
    is_org_member: bool,
    grants: &[SkillPermission],
    now: DateTime<Utc>,
) -> bool {
    match skill.visibility {
        Visibility::Public | Visibility::Unlisted => true,
        Visibility::Private => {
            let is_owner = skill.owner_id.is_some() && accessor.user_id == skill.owner_id;
            is_owner || is_org_member || grants.iter().any(|g| g.is_active(now))
        }
    }
}

/// Whether this skill should be enumerated in a search/category listing
/// for `accessor`. Anonymous queries see only `public`; `private` is never
/// enumerated here (the store pushes the accessor's accessible-id set into
/// the query separately, §4.1). `unlisted` is visible to its owner only
/// (§9 open question (c)).
pub fn visible_in_listing(skill: &Skill, accessor: &Accessor) -> bool {
    match skill.visibility {
        Visibility::Public => true,
        Visibility::Unlisted => skill.owner_id.is_some() && accessor.user_id == skill.owner_id,
        Visibility::Private => false,
    }
}
