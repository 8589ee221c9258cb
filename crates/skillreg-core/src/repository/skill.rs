use std::future::Future;

use chrono::{DateTime, Utc};
use skillreg_types::accessor::Accessor;
use skillreg_types::category::SkillCategory;
use skillreg_types::error::ApiError;
use skillreg_types::skill::{Skill, StarSnapshot};
use skillreg_types::user::{UserAction, UserActionKind};
use uuid::Uuid;

use super::SortOrder;

#[derive(Debug, Clone, Default)]
pub struct SearchParams {
    pub q: Option<String>,
    pub category: Option<String>,
    pub limit: i64,
    pub offset: i64,
    pub sort: SortOrder,
    /// Resolved by `skillreg_core::permission` before the query runs, per
    /// §4.1's "accessor descriptor pushed into the query" rule.
    pub accessor: Accessor,
}

#[derive(Debug, Clone)]
pub struct SearchResults {
    pub skills: Vec<Skill>,
    pub total: i64,
}

#[derive(Debug, Clone, Copy)]
pub struct ScoreUpdate {
    pub skill_id: Uuid,
    pub trending_score: f64,
}

/// Typed access to skill rows, transactional where the spec requires it.
pub trait SkillRepository: Send + Sync {
    /// Inserts or updates a skill row. Implementations must run the write
    /// in a transaction when it touches author denormalized counts.
    fn upsert_skill(
        &self,
        skill: &Skill,
        is_new_slug: bool,
    ) -> impl Future<Output = Result<(), ApiError>> + Send;

    fn replace_skill_categories(
        &self,
        skill_id: Uuid,
        categories: &[SkillCategory],
    ) -> impl Future<Output = Result<(), ApiError>> + Send;

    /// Category slugs assigned to a skill, for the `categories[]` field in
    /// every wire response that carries a skill (§6).
    fn categories_for_skill(
        &self,
        skill_id: Uuid,
    ) -> impl Future<Output = Result<Vec<String>, ApiError>> + Send;

    fn find_skill_by_slug(
        &self,
        slug: &str,
        accessor: &Accessor,
    ) -> impl Future<Output = Result<Option<Skill>, ApiError>> + Send;

    fn find_skill_by_id(
        &self,
        id: Uuid,
    ) -> impl Future<Output = Result<Option<Skill>, ApiError>> + Send;

    fn find_skill_by_coordinate(
        &self,
        repo_owner: &str,
        repo_name: &str,
        skill_path: &str,
    ) -> impl Future<Output = Result<Option<Skill>, ApiError>> + Send;

    fn search_skills(
        &self,
        params: &SearchParams,
    ) -> impl Future<Output = Result<SearchResults, ApiError>> + Send;

    fn list_trending(&self, limit: i64) -> impl Future<Output = Result<Vec<Skill>, ApiError>> + Send;
    fn list_top(&self, limit: i64) -> impl Future<Output = Result<Vec<Skill>, ApiError>> + Send;
    fn list_recent(&self, limit: i64) -> impl Future<Output = Result<Vec<Skill>, ApiError>> + Send;

    /// All non-archived skill ids, for Phase B score recomputation.
    fn list_active_ids(&self) -> impl Future<Output = Result<Vec<Uuid>, ApiError>> + Send;

    /// Archived skill ids, so the lifecycle manager can re-check them for
    /// resurrection without scanning the whole table.
    fn list_archived_ids(&self) -> impl Future<Output = Result<Vec<Uuid>, ApiError>> + Send;

    fn bulk_update_scores(
        &self,
        updates: &[ScoreUpdate],
    ) -> impl Future<Output = Result<(), ApiError>> + Send;

    fn get_star_snapshots(
        &self,
        skill_id: Uuid,
    ) -> impl Future<Output = Result<Vec<StarSnapshot>, ApiError>> + Send;

    fn update_snapshot_and_stats(
        &self,
        skill_id: Uuid,
        stars: i64,
        forks: i64,
        last_commit_at: Option<DateTime<Utc>>,
        snapshots: &[StarSnapshot],
        trending_score: f64,
        now: DateTime<Utc>,
    ) -> impl Future<Output = Result<(), ApiError>> + Send;

    fn mark_archived_by_coordinate(
        &self,
        repo_owner: &str,
        repo_name: &str,
    ) -> impl Future<Output = Result<(), ApiError>> + Send;

    /// Moves a skill between `hot`/`cold`/`archived` (C8, the lifecycle
    /// manager's write side).
    fn set_tier(
        &self,
        skill_id: Uuid,
        tier: skillreg_types::skill::Tier,
        now: DateTime<Utc>,
    ) -> impl Future<Output = Result<(), ApiError>> + Send;

    fn set_last_ingest_error(
        &self,
        skill_id: Uuid,
        error: &str,
    ) -> impl Future<Output = Result<(), ApiError>> + Send;

    fn record_user_action(
        &self,
        user_id: Option<Uuid>,
        subject_ip: Option<&str>,
        skill_id: Uuid,
        action: UserActionKind,
    ) -> impl Future<Output = Result<UserAction, ApiError>> + Send;
}
