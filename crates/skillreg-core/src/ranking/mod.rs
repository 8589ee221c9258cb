//! Ranking Engine (C7): hourly score recomputation, snapshot maintenance,
//! and pre-computed cache-list regeneration.

pub mod score;
pub mod snapshot;

use std::time::Duration as StdDuration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use skillreg_types::author::Author;
use skillreg_types::error::RankingError;
use skillreg_types::skill::Skill;
use uuid::Uuid;

use crate::repository::author::AuthorRepository;
use crate::repository::kv::KvStore;
use crate::repository::object_store::ObjectStore;
use crate::repository::skill::{ScoreUpdate, SkillRepository};
use crate::source_host::SourceHostClient;

const RANKING_LOCK_KEY: &str = "lock:ranking-run";
const RANKING_LOCK_TTL_SECS: u64 = 3600;
const NEEDS_UPDATE_PREFIX: &str = "needs_update:";
const SCORE_EPSILON: f64 = 0.01;
const BATCH_SIZE: usize = 100;
const CACHE_LIST_LIMIT: i64 = 50;

/// Marks a skill as needing a Phase A refresh (called by the indexing
/// worker on ingest/re-index, §4.7 Phase A).
pub async fn mark_needs_update<K: KvStore>(kv: &K, skill_id: Uuid) -> Result<(), RankingError> {
    kv.set(&format!("{NEEDS_UPDATE_PREFIX}{skill_id}"), "1", None)
        .await
        .map_err(|e| RankingError::Store(e.to_string()))
}

/// Runs one full ranking cycle: Phase A, Phase B, cache-list
/// regeneration, under a run-lock that rejects concurrent invocations.
pub async fn run_ranking<S, H, K, O, A>(
    store: &S,
    authors: &A,
    host: &H,
    kv: &K,
    objects: &O,
    now: DateTime<Utc>,
) -> Result<(), RankingError>
where
    S: SkillRepository,
    H: SourceHostClient,
    K: KvStore,
    O: ObjectStore,
    A: AuthorRepository,
{
    let acquired = kv
        .try_acquire_lock(RANKING_LOCK_KEY, StdDuration::from_secs(RANKING_LOCK_TTL_SECS))
        .await
        .map_err(|e| RankingError::Store(e.to_string()))?;
    if !acquired {
        return Err(RankingError::AlreadyRunning);
    }

    let result = async {
        phase_a_marked_updates(store, host, kv, now).await?;
        phase_b_recompute_all(store, now).await?;
        regenerate_cache_lists(store, authors, objects, now).await?;
        Ok(())
    }
    .await;

    let _ = kv.release_lock(RANKING_LOCK_KEY).await;
    result
}

async fn phase_a_marked_updates<S, H, K>(
    store: &S,
    host: &H,
    kv: &K,
    now: DateTime<Utc>,
) -> Result<(), RankingError>
where
    S: SkillRepository,
    H: SourceHostClient,
    K: KvStore,
{
    let marked_keys = kv
        .list_prefix(NEEDS_UPDATE_PREFIX)
        .await
        .map_err(|e| RankingError::Store(e.to_string()))?;

    for key in marked_keys {
        let Some(id_str) = key.strip_prefix(NEEDS_UPDATE_PREFIX) else {
            continue;
        };
        let Ok(skill_id) = id_str.parse::<Uuid>() else {
            kv.delete(&key).await.map_err(|e| RankingError::Store(e.to_string()))?;
            continue;
        };

        let Some(skill) = store
            .find_skill_by_id(skill_id)
            .await
            .map_err(|e| RankingError::Store(e.to_string()))?
        else {
            kv.delete(&key).await.map_err(|e| RankingError::Store(e.to_string()))?;
            continue;
        };

        let repo = host.get_repo(&skill.repo_owner, &skill.repo_name).await?;
        let Some(repo) = repo else {
            store
                .mark_archived_by_coordinate(&skill.repo_owner, &skill.repo_name)
                .await
                .map_err(|e| RankingError::Store(e.to_string()))?;
            kv.delete(&key).await.map_err(|e| RankingError::Store(e.to_string()))?;
            continue;
        };

        let existing = store
            .get_star_snapshots(skill.id)
            .await
            .map_err(|e| RankingError::Store(e.to_string()))?;
        let snapshots = if repo.stars != skill.stars {
            snapshot::append_and_compress(&existing, now.date_naive(), repo.stars, now)
        } else {
            existing
        };

        let trending_score = score::compute_score(repo.stars, &snapshots, skill.indexed_at, repo.pushed_at, now);

        store
            .update_snapshot_and_stats(
                skill.id,
                repo.stars,
                repo.forks,
                repo.pushed_at,
                &snapshots,
                trending_score,
                now,
            )
            .await
            .map_err(|e| RankingError::Store(e.to_string()))?;

        kv.delete(&key).await.map_err(|e| RankingError::Store(e.to_string()))?;
    }

    Ok(())
}

async fn phase_b_recompute_all<S: SkillRepository>(store: &S, now: DateTime<Utc>) -> Result<(), RankingError> {
    let ids = store
        .list_active_ids()
        .await
        .map_err(|e| RankingError::Store(e.to_string()))?;

    let mut batch = Vec::with_capacity(BATCH_SIZE);
    for id in ids {
        let Some(skill) = store
            .find_skill_by_id(id)
            .await
            .map_err(|e| RankingError::Store(e.to_string()))?
        else {
            continue;
        };
        let snapshots = store
            .get_star_snapshots(skill.id)
            .await
            .map_err(|e| RankingError::Store(e.to_string()))?;
        let new_score = score::compute_score(skill.stars, &snapshots, skill.indexed_at, skill.last_commit_at, now);
        if (new_score - skill.trending_score).abs() > SCORE_EPSILON {
            batch.push(ScoreUpdate {
                skill_id: skill.id,
                trending_score: new_score,
            });
        }
        if batch.len() >= BATCH_SIZE {
            store
                .bulk_update_scores(&batch)
                .await
                .map_err(|e| RankingError::Store(e.to_string()))?;
            batch.clear();
        }
    }
    if !batch.is_empty() {
        store
            .bulk_update_scores(&batch)
            .await
            .map_err(|e| RankingError::Store(e.to_string()))?;
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize)]
struct CacheListEntry {
    slug: String,
    name: String,
    stars: i64,
    trending_score: f64,
    indexed_at: DateTime<Utc>,
    author_avatar: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
struct CacheList {
    generated_at: DateTime<Utc>,
    items: Vec<CacheListEntry>,
}

async fn to_cache_entries<A: AuthorRepository>(skills: &[Skill], authors: &A) -> Vec<CacheListEntry> {
    let mut entries = Vec::with_capacity(skills.len());
    for s in skills {
        let author: Option<Author> = authors.find_by_username(&s.repo_owner).await.ok().flatten();
        entries.push(CacheListEntry {
            slug: s.slug.clone(),
            name: s.name.clone(),
            stars: s.stars,
            trending_score: s.trending_score,
            indexed_at: s.indexed_at,
            author_avatar: author.and_then(|a| a.avatar_url),
        });
    }
    entries
}

async fn regenerate_cache_lists<S, A, O>(
    store: &S,
    authors: &A,
    objects: &O,
    now: DateTime<Utc>,
) -> Result<(), RankingError>
where
    S: SkillRepository,
    A: AuthorRepository,
    O: ObjectStore,
{
    let trending = store
        .list_trending(CACHE_LIST_LIMIT)
        .await
        .map_err(|e| RankingError::Store(e.to_string()))?;
    let top = store
        .list_top(CACHE_LIST_LIMIT)
        .await
        .map_err(|e| RankingError::Store(e.to_string()))?;
    let recent = store
        .list_recent(CACHE_LIST_LIMIT)
        .await
        .map_err(|e| RankingError::Store(e.to_string()))?;

    for (key, skills) in [
        ("cache/trending.json", trending),
        ("cache/top.json", top),
        ("cache/recent.json", recent),
    ] {
        let list = CacheList {
            generated_at: now,
            items: to_cache_entries(&skills, authors).await,
        };
        let bytes = serde_json::to_vec(&list).map_err(|e| RankingError::Store(e.to_string()))?;
        objects
            .put(key, &bytes)
            .await
            .map_err(|e| RankingError::Store(e.to_string()))?;
    }

    Ok(())
}
