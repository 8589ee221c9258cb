//! Shared read-path helper: resolves a hosted skill's `SKILL.md` body
//! through the content cache in front of the object store (§4.3).

use std::time::Instant;

use skillreg_core::repository::object_store::ObjectStore;
use skillreg_infra::cache::lru::decide;
use skillreg_infra::{cache_key, CacheDecision, CacheEntry, ContentSource};
use skillreg_types::error::ApiError;
use skillreg_types::skill::Skill;

use crate::state::AppState;

pub fn object_key(skill: &Skill) -> String {
    if skill.skill_path.is_empty() {
        format!("skills/{}/{}/SKILL.md", skill.repo_owner, skill.repo_name)
    } else {
        format!("skills/{}/{}/{}/SKILL.md", skill.repo_owner, skill.repo_name, skill.skill_path)
    }
}

pub async fn read_content(state: &AppState, skill: &Skill) -> Result<String, ApiError> {
    let key = cache_key(&skill.repo_owner, &skill.repo_name, &skill.skill_path);
    let lock = state.cache.lock_key(&key).await;
    let _guard = lock.lock().await;

    let cached = state.cache.get(&key);
    match decide(cached.as_ref(), Some(&skill.content_hash), Instant::now()) {
        CacheDecision::Serve => Ok(cached.expect("decide(Serve) implies an entry").content),
        CacheDecision::Refetch => {
            let bytes = state.objects.get(&object_key(skill)).await?;
            let content = bytes.map(|b| String::from_utf8_lossy(&b).into_owned()).unwrap_or_default();
            state.cache.put(
                key,
                CacheEntry {
                    content: content.clone(),
                    content_hash: skill.content_hash.clone(),
                    commit_sha: None,
                    source: ContentSource::Registry,
                    cached_at: Instant::now(),
                    last_accessed_at: Instant::now(),
                },
            );
            Ok(content)
        }
    }
}
