//! `GET /registry/skill/{owner}/{name}` and the legacy single-segment
//! `GET /registry/skill/{identifier}` (§6).

use axum::extract::{Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use chrono::Utc;
use skillreg_core::permission::can_access;
use skillreg_core::repository::permission::PermissionRepository;
use skillreg_core::repository::skill::SkillRepository;
use skillreg_core::skill::identifier::parse_identifier;
use skillreg_types::error::ApiError;
use skillreg_types::skill::Skill;

use crate::http::cache_control;
use crate::http::content::read_content;
use crate::http::error::AppError;
use crate::http::extractors::auth::AccessorExtractor;
use crate::http::response::SkillDetailResponse;
use crate::state::AppState;

pub async fn by_owner_and_name(
    State(state): State<AppState>,
    AccessorExtractor(accessor): AccessorExtractor,
    Path((owner, name)): Path<(String, String)>,
) -> Result<Response, AppError> {
    let skill = state
        .skills
        .find_skill_by_coordinate(&owner, &name, "")
        .await?
        .ok_or(ApiError::NotFound)?;

    render_detail(&state, &accessor, skill).await
}

pub async fn by_identifier(
    State(state): State<AppState>,
    AccessorExtractor(accessor): AccessorExtractor,
    Path(identifier): Path<String>,
) -> Result<Response, AppError> {
    let skill = match parse_identifier(&identifier) {
        Some((owner, name)) => state.skills.find_skill_by_coordinate(&owner, &name, "").await?,
        None => state.skills.find_skill_by_slug(&identifier, &accessor).await?,
    }
    .ok_or(ApiError::NotFound)?;

    render_detail(&state, &accessor, skill).await
}

async fn render_detail(
    state: &AppState,
    accessor: &skillreg_types::accessor::Accessor,
    skill: Skill,
) -> Result<Response, AppError> {
    let grants = state.permissions.active_grants_for_skill(skill.id).await?;
    let is_org_member = match (accessor.user_id, skill.org_id) {
        (Some(user_id), Some(org_id)) => state.permissions.is_org_member(user_id, org_id).await?,
        _ => false,
    };
    if !can_access(&skill, accessor, is_org_member, &grants, Utc::now()) {
        return Err(AppError::from(ApiError::NotFound));
    }

    let categories = state.skills.categories_for_skill(skill.id).await?;
    let content = read_content(state, &skill).await?;
    let visibility = skill.visibility;
    let body = SkillDetailResponse::from_skill(&skill, categories, content);

    let mut response = axum::Json(body).into_response();
    response.headers_mut().insert(header::CACHE_CONTROL, cache_control::for_visibility(visibility));
    Ok(response)
}
