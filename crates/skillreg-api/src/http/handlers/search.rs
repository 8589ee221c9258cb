//! `GET /registry/search` (§6). Anonymous requests are cached 60 s by
//! `(q, category, limit, offset)`; authenticated requests never are,
//! since `include_private` makes the result set caller-specific.

use std::time::Duration;

use axum::extract::{Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use skillreg_core::repository::kv::KvStore;
use skillreg_core::repository::skill::SearchParams;
use skillreg_core::repository::skill::SkillRepository;
use skillreg_core::repository::SortOrder;

use crate::http::cache_control;
use crate::http::error::AppError;
use crate::http::extractors::auth::AccessorExtractor;
use crate::http::extractors::query::RegistrySearchQuery;
use crate::http::response::{SearchResponse, SearchSkillItem};
use crate::state::AppState;

pub async fn search(
    State(state): State<AppState>,
    AccessorExtractor(accessor): AccessorExtractor,
    Query(query): Query<RegistrySearchQuery>,
) -> Result<Response, AppError> {
    let is_anonymous = accessor.is_anonymous();
    let cache_key = is_anonymous.then(|| {
        format!(
            "search-cache:{}:{}:{}:{}",
            query.q.as_deref().unwrap_or(""),
            query.category.as_deref().unwrap_or(""),
            query.normalized_limit(),
            query.normalized_offset(),
        )
    });

    if let Some(key) = &cache_key {
        if let Some(cached) = state.kv.get(key).await? {
            if let Ok(response) = serde_json::from_str::<SearchResponse>(&cached) {
                return Ok(respond(response, true));
            }
        }
    }

    let sort = match query.sort.as_deref() {
        Some("stars") => SortOrder::Stars,
        Some("recent") => SortOrder::Recent,
        _ => SortOrder::Trending,
    };

    // `include_private` opts an authenticated caller into seeing their own
    // private/unlisted skills in listing results; omitting it restricts
    // the query to public skills even when a valid token was presented.
    let effective_accessor =
        if query.include_private { accessor } else { skillreg_types::accessor::Accessor::anonymous() };

    let params = SearchParams {
        q: query.q.clone().filter(|s| !s.is_empty()),
        category: query.category.clone().filter(|s| !s.is_empty()),
        limit: query.normalized_limit(),
        offset: query.normalized_offset(),
        sort,
        accessor: effective_accessor,
    };

    let results = state.skills.search_skills(&params).await?;

    let mut skills = Vec::with_capacity(results.skills.len());
    for skill in &results.skills {
        let categories = state.skills.categories_for_skill(skill.id).await?;
        skills.push(SearchSkillItem::from_skill(skill, categories));
    }

    let response = SearchResponse { skills, total: results.total };

    if let Some(key) = &cache_key {
        if let Ok(serialized) = serde_json::to_string(&response) {
            let ttl = Duration::from_secs(state.config.search_cache_ttl_secs);
            state.kv.set(key, &serialized, Some(ttl)).await?;
        }
    }

    Ok(respond(response, is_anonymous))
}

fn respond(body: SearchResponse, is_public: bool) -> Response {
    let mut response = axum::Json(body).into_response();
    response.headers_mut().insert(header::CACHE_CONTROL, cache_control::for_is_public(is_public));
    response
}
