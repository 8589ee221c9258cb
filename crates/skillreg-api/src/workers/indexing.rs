//! Indexing Worker (C5, §4.5). Resolves one repo coordinate, discovers
//! `SKILL.md` candidates under the curated paths, and upserts a skill row
//! plus its object-store content per unchanged-content-is-a-no-op rule.

use std::time::Duration;

use chrono::Utc;
use skillreg_core::queue::{backoff_delay, Queue};
use skillreg_core::repository::author::AuthorRepository;
use skillreg_core::repository::kv::KvStore;
use skillreg_core::repository::object_store::ObjectStore;
use skillreg_core::repository::skill::SkillRepository;
use skillreg_core::skill::manifest;
use skillreg_core::source_host::SourceHostClient;
use skillreg_infra::crypto::hash::content_hash;
use skillreg_types::author::{Author, AuthorType};
use skillreg_types::error::ApiError;
use skillreg_types::skill::{Skill, SourceType, Tier, Visibility};
use tracing::{info, warn};
use uuid::Uuid;

use crate::state::{AppState, ClassifyJob, IndexJob};

const INDEX_LOCK_TTL: Duration = Duration::from_secs(300);
const MAX_ATTEMPTS: u32 = 5;

/// Pulls one job off the indexing queue and processes it, returning
/// `false` if the queue was empty.
pub async fn process_one(state: &AppState) -> Result<bool, ApiError> {
    let Some(delivery) = state.index_queue.dequeue().await.map_err(|e| ApiError::Transient(e.to_string()))? else {
        return Ok(false);
    };

    let lock_key = format!("lock:index:{}:{}", delivery.job.owner, delivery.job.repo);
    if !state.kv.try_acquire_lock(&lock_key, INDEX_LOCK_TTL).await? {
        state
            .index_queue
            .nack(delivery.attempt, Duration::from_secs(5), MAX_ATTEMPTS)
            .await
            .map_err(|e| ApiError::Transient(e.to_string()))?;
        return Ok(true);
    }

    let result = ingest_repo(state, &delivery.job).await;
    state.kv.release_lock(&lock_key).await?;

    match result {
        Ok(()) => {
            state.index_queue.ack(delivery.attempt).await.map_err(|e| ApiError::Transient(e.to_string()))?;
        }
        Err(err) => {
            warn!(owner = %delivery.job.owner, repo = %delivery.job.repo, error = %err, "indexing job failed");
            let delay = backoff_delay(delivery.attempt, Duration::from_secs(2), Duration::from_secs(120));
            state
                .index_queue
                .nack(delivery.attempt, delay, MAX_ATTEMPTS)
                .await
                .map_err(|e| ApiError::Transient(e.to_string()))?;
        }
    }
    Ok(true)
}

async fn ingest_repo(state: &AppState, job: &IndexJob) -> Result<(), ApiError> {
    let repo_meta = state
        .host
        .get_repo(&job.owner, &job.repo)
        .await
        .map_err(|e| ApiError::UpstreamUnavailable(e.to_string()))?;

    let Some(repo_meta) = repo_meta else {
        state.skills.mark_archived_by_coordinate(&job.owner, &job.repo).await?;
        info!(owner = %job.owner, repo = %job.repo, "repo no longer found, archived existing skills");
        return Ok(());
    };

    let all_paths = state
        .host
        .list_tree(&job.owner, &job.repo, &repo_meta.default_branch)
        .await
        .map_err(|e| ApiError::UpstreamUnavailable(e.to_string()))?;

    let candidates = manifest::discover_skill_paths(
        &all_paths,
        &state.config.discovery_paths,
        state.config.discovery_max_depth,
    );

    for path in candidates {
        if let Err(err) = ingest_candidate(state, job, &repo_meta, path, &all_paths).await {
            warn!(owner = %job.owner, repo = %job.repo, path, error = %err, "skipping candidate");
        }
    }

    Ok(())
}

async fn ingest_candidate(
    state: &AppState,
    job: &IndexJob,
    repo_meta: &skillreg_core::source_host::RepoMeta,
    path: &str,
    all_paths: &[String],
) -> Result<(), ApiError> {
    let file = state
        .host
        .get_file_content(&job.owner, &job.repo, path)
        .await
        .map_err(|e| ApiError::UpstreamUnavailable(e.to_string()))?;

    let (manifest, _body) = manifest::parse_skill_md(&file.content).map_err(|e| ApiError::Validation(e.to_string()))?;
    if !manifest.is_valid() {
        return Ok(());
    }

    let skill_path = manifest::skill_path_for(path);
    let new_hash = content_hash(file.content.as_bytes());
    let existing = state.skills.find_skill_by_coordinate(&job.owner, &job.repo, &skill_path).await?;

    if let Some(existing) = &existing {
        if existing.content_hash == new_hash {
            return Ok(());
        }
    }

    let is_new = existing.is_none();
    let slug = match &existing {
        Some(e) => e.slug.clone(),
        None => {
            let extra = if skill_path.is_empty() { None } else { Some(skill_path.as_str()) };
            let base = skillreg_types::skill::compute_slug(&job.owner, &job.repo, extra);
            unique_slug(state, &base).await?
        }
    };

    let object_key = if skill_path.is_empty() {
        format!("skills/{}/{}/SKILL.md", job.owner, job.repo)
    } else {
        format!("skills/{}/{}/{}/SKILL.md", job.owner, job.repo, skill_path)
    };
    state.objects.put(&object_key, file.content.as_bytes()).await?;

    let now = Utc::now();
    let author = match state.authors.find_by_username(&job.owner).await? {
        Some(mut a) => {
            a.updated_at = now;
            a
        }
        None => Author {
            username: job.owner.clone(),
            github_id: None,
            display_name: None,
            avatar_url: None,
            bio: None,
            author_type: AuthorType::User,
            skills_count: 0,
            total_stars: 0,
            created_at: now,
            updated_at: now,
        },
    };
    state.authors.upsert(&author, is_new).await?;

    let skill = Skill {
        id: existing.as_ref().map(|e| e.id).unwrap_or_else(Uuid::new_v4),
        slug,
        name: manifest.name,
        description: manifest.description,
        repo_owner: job.owner.clone(),
        repo_name: job.repo.clone(),
        skill_path,
        github_url: format!("https://github.com/{}/{}", job.owner, job.repo),
        stars: repo_meta.stars,
        forks: repo_meta.forks,
        trending_score: existing.as_ref().map(|e| e.trending_score).unwrap_or(0.0),
        indexed_at: now,
        updated_at: now,
        last_commit_at: repo_meta.pushed_at,
        readme: existing.as_ref().and_then(|e| e.readme.clone()),
        file_structure: serde_json::to_string(all_paths).ok(),
        star_snapshots: existing.as_ref().map(|e| e.star_snapshots.clone()).unwrap_or_default(),
        visibility: existing.as_ref().map(|e| e.visibility).unwrap_or(Visibility::Public),
        source_type: SourceType::Hosted,
        tier: existing.as_ref().map(|e| e.tier).unwrap_or(Tier::Hot),
        owner_id: existing.as_ref().and_then(|e| e.owner_id),
        org_id: existing.as_ref().and_then(|e| e.org_id),
        content_hash: new_hash,
        last_ingest_error: None,
    };
    let skill_id = skill.id;
    state.skills.upsert_skill(&skill, is_new).await?;

    state
        .classify_queue
        .enqueue(ClassifyJob { skill_id })
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    Ok(())
}

async fn unique_slug(state: &AppState, base: &str) -> Result<String, ApiError> {
    if state.skills.find_skill_by_slug(base, &skillreg_types::accessor::Accessor::anonymous()).await?.is_none() {
        return Ok(base.to_string());
    }
    let mut attempt = 0u32;
    loop {
        let candidate = skillreg_types::skill::disambiguate_slug(base, attempt);
        if state
            .skills
            .find_skill_by_slug(&candidate, &skillreg_types::accessor::Accessor::anonymous())
            .await?
            .is_none()
        {
            return Ok(candidate);
        }
        attempt += 1;
    }
}
