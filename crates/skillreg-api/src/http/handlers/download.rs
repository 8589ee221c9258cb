//! `GET /skills/{slug}/download` (§6): non-public skills require a
//! read-scoped token; public skills are open.

use axum::extract::{Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use chrono::Utc;
use skillreg_core::lifecycle::should_resurrect_on_access;
use skillreg_core::permission::can_access;
use skillreg_core::repository::permission::PermissionRepository;
use skillreg_core::repository::skill::SkillRepository;
use skillreg_types::auth::TokenScope;
use skillreg_types::error::ApiError;
use skillreg_types::skill::{Tier, Visibility};
use skillreg_types::user::UserActionKind;

use crate::http::cache_control;
use crate::http::content::read_content;
use crate::http::error::AppError;
use crate::http::extractors::auth::AccessorExtractor;
use crate::state::AppState;
use crate::zip::single_file_zip;

pub async fn download(
    State(state): State<AppState>,
    AccessorExtractor(accessor): AccessorExtractor,
    Path(slug): Path<String>,
) -> Result<Response, AppError> {
    let skill = state.skills.find_skill_by_slug(&slug, &accessor).await?.ok_or(ApiError::NotFound)?;

    if skill.visibility != Visibility::Public {
        if !accessor.has_scope(TokenScope::Read) {
            return Err(AppError::from(ApiError::Unauthorized));
        }
        let grants = state.permissions.active_grants_for_skill(skill.id).await?;
        let is_org_member = match (accessor.user_id, skill.org_id) {
            (Some(user_id), Some(org_id)) => state.permissions.is_org_member(user_id, org_id).await?,
            _ => false,
        };
        if !can_access(&skill, &accessor, is_org_member, &grants, Utc::now()) {
            return Err(AppError::from(ApiError::NotFound));
        }
    }

    let content = read_content(&state, &skill).await?;
    let archive = single_file_zip("SKILL.md", content.as_bytes());

    let now = Utc::now();
    state.skills.record_user_action(accessor.user_id, None, skill.id, UserActionKind::Download).await?;
    if skill.tier != Tier::Hot && should_resurrect_on_access(skill.stars, skill.last_commit_at, now) {
        state.skills.set_tier(skill.id, Tier::Hot, now).await?;
    }

    let mut response = (
        [
            (header::CONTENT_TYPE, "application/zip".to_string()),
            (header::CONTENT_DISPOSITION, format!("attachment; filename=\"{}.zip\"", skill.slug)),
        ],
        archive,
    )
        .into_response();
    response.headers_mut().insert(header::CACHE_CONTROL, cache_control::for_visibility(skill.visibility));

    Ok(response)
}
