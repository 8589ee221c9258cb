//! SQLite-backed `SkillRepository` (C1). Visibility is pushed into the
//! `WHERE` clause rather than filtered after the fact, per §4.1/§4.9.

use chrono::{DateTime, Utc};
use skillreg_core::repository::skill::{ScoreUpdate, SearchParams, SearchResults, SkillRepository};
use skillreg_types::accessor::Accessor;
use skillreg_types::category::SkillCategory;
use skillreg_types::error::ApiError;
use skillreg_types::skill::{Skill, SourceType, StarSnapshot, Tier, Visibility};
use skillreg_types::user::{UserAction, UserActionKind};
use sqlx::Row;
use uuid::Uuid;

use super::pool::DatabasePool;

pub struct SqliteSkillRepository {
    pool: DatabasePool,
}

impl SqliteSkillRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

fn visibility_to_str(v: Visibility) -> &'static str {
    match v {
        Visibility::Public => "public",
        Visibility::Unlisted => "unlisted",
        Visibility::Private => "private",
    }
}

fn visibility_from_str(s: &str) -> Result<Visibility, ApiError> {
    match s {
        "public" => Ok(Visibility::Public),
        "unlisted" => Ok(Visibility::Unlisted),
        "private" => Ok(Visibility::Private),
        other => Err(ApiError::Internal(format!("unknown visibility: {other}"))),
    }
}

fn source_type_to_str(v: SourceType) -> &'static str {
    match v {
        SourceType::Hosted => "hosted",
        SourceType::Upload => "upload",
    }
}

fn source_type_from_str(s: &str) -> Result<SourceType, ApiError> {
    match s {
        "hosted" => Ok(SourceType::Hosted),
        "upload" => Ok(SourceType::Upload),
        other => Err(ApiError::Internal(format!("unknown source_type: {other}"))),
    }
}

fn tier_to_str(v: Tier) -> &'static str {
    match v {
        Tier::Hot => "hot",
        Tier::Cold => "cold",
        Tier::Archived => "archived",
    }
}

fn tier_from_str(s: &str) -> Result<Tier, ApiError> {
    match s {
        "hot" => Ok(Tier::Hot),
        "cold" => Ok(Tier::Cold),
        "archived" => Ok(Tier::Archived),
        other => Err(ApiError::Internal(format!("unknown tier: {other}"))),
    }
}

fn parse_datetime(s: &str) -> Result<DateTime<Utc>, ApiError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| ApiError::Internal(format!("invalid datetime: {e}")))
}

fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

fn parse_snapshots(s: &str) -> Result<Vec<StarSnapshot>, ApiError> {
    serde_json::from_str(s).map_err(|e| ApiError::Internal(format!("invalid star_snapshots: {e}")))
}

fn format_snapshots(snapshots: &[StarSnapshot]) -> Result<String, ApiError> {
    serde_json::to_string(snapshots).map_err(|e| ApiError::Internal(e.to_string()))
}

struct SkillRow {
    id: String,
    slug: String,
    name: String,
    description: String,
    repo_owner: String,
    repo_name: String,
    skill_path: String,
    github_url: String,
    stars: i64,
    forks: i64,
    trending_score: f64,
    indexed_at: String,
    updated_at: String,
    last_commit_at: Option<String>,
    readme: Option<String>,
    file_structure: Option<String>,
    star_snapshots: String,
    visibility: String,
    source_type: String,
    tier: String,
    owner_id: Option<String>,
    org_id: Option<String>,
    content_hash: String,
    last_ingest_error: Option<String>,
}

impl SkillRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            slug: row.try_get("slug")?,
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            repo_owner: row.try_get("repo_owner")?,
            repo_name: row.try_get("repo_name")?,
            skill_path: row.try_get("skill_path")?,
            github_url: row.try_get("github_url")?,
            stars: row.try_get("stars")?,
            forks: row.try_get("forks")?,
            trending_score: row.try_get("trending_score")?,
            indexed_at: row.try_get("indexed_at")?,
            updated_at: row.try_get("updated_at")?,
            last_commit_at: row.try_get("last_commit_at")?,
            readme: row.try_get("readme")?,
            file_structure: row.try_get("file_structure")?,
            star_snapshots: row.try_get("star_snapshots")?,
            visibility: row.try_get("visibility")?,
            source_type: row.try_get("source_type")?,
            tier: row.try_get("tier")?,
            owner_id: row.try_get("owner_id")?,
            org_id: row.try_get("org_id")?,
            content_hash: row.try_get("content_hash")?,
            last_ingest_error: row.try_get("last_ingest_error")?,
        })
    }

    fn into_skill(self) -> Result<Skill, ApiError> {
        Ok(Skill {
            id: Uuid::parse_str(&self.id).map_err(|e| ApiError::Internal(e.to_string()))?,
            slug: self.slug,
            name: self.name,
            description: self.description,
            repo_owner: self.repo_owner,
            repo_name: self.repo_name,
            skill_path: self.skill_path,
            github_url: self.github_url,
            stars: self.stars,
            forks: self.forks,
            trending_score: self.trending_score,
            indexed_at: parse_datetime(&self.indexed_at)?,
            updated_at: parse_datetime(&self.updated_at)?,
            last_commit_at: self.last_commit_at.as_deref().map(parse_datetime).transpose()?,
            readme: self.readme,
            file_structure: self.file_structure,
            star_snapshots: parse_snapshots(&self.star_snapshots)?,
            visibility: visibility_from_str(&self.visibility)?,
            source_type: source_type_from_str(&self.source_type)?,
            tier: tier_from_str(&self.tier)?,
            owner_id: self.owner_id.as_deref().map(Uuid::parse_str).transpose().map_err(|e| ApiError::Internal(e.to_string()))?,
            org_id: self.org_id.as_deref().map(Uuid::parse_str).transpose().map_err(|e| ApiError::Internal(e.to_string()))?,
            content_hash: self.content_hash,
            last_ingest_error: self.last_ingest_error,
        })
    }
}

/// A skill is directly accessible (by slug or id) iff it is public or
/// unlisted, or it is private and the accessor owns it, belongs to its
/// org, or holds an active grant (§4.9's `can_access`, not the stricter
/// listing rule).
const DIRECT_ACCESS_CLAUSE: &str = "(
    visibility IN ('public', 'unlisted')
    OR (visibility = 'private' AND (
        owner_id = ?
        OR org_id IN (SELECT org_id FROM org_members WHERE user_id = ?)
        OR id IN (
            SELECT skill_id FROM skill_permissions
            WHERE (expires_at IS NULL OR expires_at > datetime('now'))
            AND (
                (grantee_type = 'user' AND grantee_id = ?)
                OR (grantee_type = 'org' AND grantee_id IN (SELECT org_id FROM org_members WHERE user_id = ?))
            )
        )
    ))
)";

/// A skill is enumerable in search/listing iff it is public, or unlisted
/// and owned by the accessor, or private and the accessor has access
/// (§4.9, §9 open question (c)).
const LISTING_CLAUSE: &str = "(
    visibility = 'public'
    OR (visibility = 'unlisted' AND owner_id = ?)
    OR (visibility = 'private' AND (
        owner_id = ?
        OR org_id IN (SELECT org_id FROM org_members WHERE user_id = ?)
        OR id IN (
            SELECT skill_id FROM skill_permissions
            WHERE (expires_at IS NULL OR expires_at > datetime('now'))
            AND (
                (grantee_type = 'user' AND grantee_id = ?)
                OR (grantee_type = 'org' AND grantee_id IN (SELECT org_id FROM org_members WHERE user_id = ?))
            )
        )
    ))
)";

impl SkillRepository for SqliteSkillRepository {
    async fn upsert_skill(&self, skill: &Skill, is_new_slug: bool) -> Result<(), ApiError> {
        let snapshots = format_snapshots(&skill.star_snapshots)?;

        if is_new_slug {
            let result = sqlx::query(
                "INSERT INTO skills (id, slug, name, description, repo_owner, repo_name, skill_path, github_url,
                    stars, forks, trending_score, indexed_at, updated_at, last_commit_at, readme, file_structure,
                    star_snapshots, visibility, source_type, tier, owner_id, org_id, content_hash, last_ingest_error)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(skill.id.to_string())
            .bind(&skill.slug)
            .bind(&skill.name)
            .bind(&skill.description)
            .bind(&skill.repo_owner)
            .bind(&skill.repo_name)
            .bind(&skill.skill_path)
            .bind(&skill.github_url)
            .bind(skill.stars)
            .bind(skill.forks)
            .bind(skill.trending_score)
            .bind(format_datetime(&skill.indexed_at))
            .bind(format_datetime(&skill.updated_at))
            .bind(skill.last_commit_at.as_ref().map(format_datetime))
            .bind(&skill.readme)
            .bind(&skill.file_structure)
            .bind(snapshots)
            .bind(visibility_to_str(skill.visibility))
            .bind(source_type_to_str(skill.source_type))
            .bind(tier_to_str(skill.tier))
            .bind(skill.owner_id.map(|u| u.to_string()))
            .bind(skill.org_id.map(|u| u.to_string()))
            .bind(&skill.content_hash)
            .bind(&skill.last_ingest_error)
            .execute(&self.pool.writer)
            .await;

            match result {
                Ok(_) => Ok(()),
                Err(sqlx::Error::Database(e)) if e.message().contains("UNIQUE") => {
                    Err(ApiError::Conflict(format!("slug '{}' already exists", skill.slug)))
                }
                Err(e) => Err(ApiError::Transient(e.to_string())),
            }
        } else {
            let result = sqlx::query(
                "UPDATE skills SET name = ?, description = ?, github_url = ?, stars = ?, forks = ?,
                    trending_score = ?, updated_at = ?, last_commit_at = ?, readme = ?, file_structure = ?,
                    star_snapshots = ?, visibility = ?, tier = ?, content_hash = ?, last_ingest_error = NULL
                 WHERE id = ?",
            )
            .bind(&skill.name)
            .bind(&skill.description)
            .bind(&skill.github_url)
            .bind(skill.stars)
            .bind(skill.forks)
            .bind(skill.trending_score)
            .bind(format_datetime(&skill.updated_at))
            .bind(skill.last_commit_at.as_ref().map(format_datetime))
            .bind(&skill.readme)
            .bind(&skill.file_structure)
            .bind(snapshots)
            .bind(visibility_to_str(skill.visibility))
            .bind(tier_to_str(skill.tier))
            .bind(&skill.content_hash)
            .bind(skill.id.to_string())
            .execute(&self.pool.writer)
            .await
            .map_err(|e| ApiError::Transient(e.to_string()))?;

            if result.rows_affected() == 0 {
                return Err(ApiError::NotFound);
            }
            Ok(())
        }
    }

    async fn replace_skill_categories(&self, skill_id: Uuid, categories: &[SkillCategory]) -> Result<(), ApiError> {
        let mut tx = self.pool.writer.begin().await.map_err(|e| ApiError::Transient(e.to_string()))?;

        sqlx::query("DELETE FROM skill_categories WHERE skill_id = ?")
            .bind(skill_id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(|e| ApiError::Transient(e.to_string()))?;

        for c in categories {
            sqlx::query("INSERT INTO skill_categories (skill_id, category_slug, score) VALUES (?, ?, ?)")
                .bind(skill_id.to_string())
                .bind(&c.category_slug)
                .bind(c.score)
                .execute(&mut *tx)
                .await
                .map_err(|e| ApiError::Transient(e.to_string()))?;
        }

        tx.commit().await.map_err(|e| ApiError::Transient(e.to_string()))?;
        Ok(())
    }

    async fn categories_for_skill(&self, skill_id: Uuid) -> Result<Vec<String>, ApiError> {
        let rows = sqlx::query("SELECT category_slug FROM skill_categories WHERE skill_id = ? ORDER BY score DESC")
            .bind(skill_id.to_string())
            .fetch_all(&self.pool.reader)
            .await
            .map_err(|e| ApiError::Transient(e.to_string()))?;
        rows.iter().map(|r| r.try_get("category_slug").map_err(|e| ApiError::Internal(e.to_string()))).collect()
    }

    async fn find_skill_by_slug(&self, slug: &str, accessor: &Accessor) -> Result<Option<Skill>, ApiError> {
        let uid = accessor.user_id.map(|u| u.to_string());
        let sql = format!("SELECT * FROM skills WHERE slug = ? AND {DIRECT_ACCESS_CLAUSE}");
        let row = sqlx::query(&sql)
            .bind(slug)
            .bind(&uid)
            .bind(&uid)
            .bind(&uid)
            .bind(&uid)
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(|e| ApiError::Transient(e.to_string()))?;

        row.map(|r| SkillRow::from_row(&r).map_err(|e| ApiError::Internal(e.to_string()))?.into_skill())
            .transpose()
    }

    async fn find_skill_by_id(&self, id: Uuid) -> Result<Option<Skill>, ApiError> {
        let row = sqlx::query("SELECT * FROM skills WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(|e| ApiError::Transient(e.to_string()))?;

        row.map(|r| SkillRow::from_row(&r).map_err(|e| ApiError::Internal(e.to_string()))?.into_skill())
            .transpose()
    }

    async fn find_skill_by_coordinate(
        &self,
        repo_owner: &str,
        repo_name: &str,
        skill_path: &str,
    ) -> Result<Option<Skill>, ApiError> {
        let row = sqlx::query("SELECT * FROM skills WHERE repo_owner = ? AND repo_name = ? AND skill_path = ? AND source_type = 'hosted'")
            .bind(repo_owner)
            .bind(repo_name)
            .bind(skill_path)
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(|e| ApiError::Transient(e.to_string()))?;

        row.map(|r| SkillRow::from_row(&r).map_err(|e| ApiError::Internal(e.to_string()))?.into_skill())
            .transpose()
    }

    async fn search_skills(&self, params: &SearchParams) -> Result<SearchResults, ApiError> {
        let uid = params.accessor.user_id.map(|u| u.to_string());

        let mut filter_sql = format!("{LISTING_CLAUSE}");
        if params.q.is_some() {
            filter_sql.push_str(" AND (name LIKE ? OR description LIKE ?)");
        }
        if params.category.is_some() {
            filter_sql.push_str(" AND id IN (SELECT skill_id FROM skill_categories WHERE category_slug = ?)");
        }

        let count_sql = format!("SELECT COUNT(*) FROM skills WHERE {filter_sql}");
        let mut count_query = sqlx::query_as::<_, (i64,)>(&count_sql);
        count_query = count_query.bind(&uid).bind(&uid).bind(&uid).bind(&uid).bind(&uid);
        let like_pattern = params.q.as_ref().map(|q| format!("%{q}%"));
        if let Some(pat) = &like_pattern {
            count_query = count_query.bind(pat).bind(pat);
        }
        if let Some(category) = &params.category {
            count_query = count_query.bind(category);
        }
        let total = count_query.fetch_one(&self.pool.reader).await.map_err(|e| ApiError::Transient(e.to_string()))?.0;

        let order_by = match params.sort {
            skillreg_core::repository::SortOrder::Trending => "trending_score DESC",
            skillreg_core::repository::SortOrder::Stars => "stars DESC",
            skillreg_core::repository::SortOrder::Recent => "indexed_at DESC",
        };
        let select_sql = format!("SELECT * FROM skills WHERE {filter_sql} ORDER BY {order_by} LIMIT ? OFFSET ?");

        let mut query = sqlx::query(&select_sql);
        query = query.bind(&uid).bind(&uid).bind(&uid).bind(&uid).bind(&uid);
        if let Some(pat) = &like_pattern {
            query = query.bind(pat).bind(pat);
        }
        if let Some(category) = &params.category {
            query = query.bind(category);
        }
        query = query.bind(params.limit).bind(params.offset);

        let rows = query.fetch_all(&self.pool.reader).await.map_err(|e| ApiError::Transient(e.to_string()))?;
        let mut skills = Vec::with_capacity(rows.len());
        for row in &rows {
            skills.push(SkillRow::from_row(row).map_err(|e| ApiError::Internal(e.to_string()))?.into_skill()?);
        }

        Ok(SearchResults { skills, total })
    }

    async fn list_trending(&self, limit: i64) -> Result<Vec<Skill>, ApiError> {
        self.list_public_ordered("trending_score DESC", limit).await
    }

    async fn list_top(&self, limit: i64) -> Result<Vec<Skill>, ApiError> {
        self.list_public_ordered("stars DESC", limit).await
    }

    async fn list_recent(&self, limit: i64) -> Result<Vec<Skill>, ApiError> {
        self.list_public_ordered("indexed_at DESC", limit).await
    }

    async fn list_active_ids(&self) -> Result<Vec<Uuid>, ApiError> {
        let rows = sqlx::query("SELECT id FROM skills WHERE tier != 'archived'")
            .fetch_all(&self.pool.reader)
            .await
            .map_err(|e| ApiError::Transient(e.to_string()))?;
        rows.iter()
            .map(|r| {
                let id: String = r.try_get("id").map_err(|e| ApiError::Internal(e.to_string()))?;
                Uuid::parse_str(&id).map_err(|e| ApiError::Internal(e.to_string()))
            })
            .collect()
    }

    async fn list_archived_ids(&self) -> Result<Vec<Uuid>, ApiError> {
        let rows = sqlx::query("SELECT id FROM skills WHERE tier = 'archived'")
            .fetch_all(&self.pool.reader)
            .await
            .map_err(|e| ApiError::Transient(e.to_string()))?;
        rows.iter()
            .map(|r| {
                let id: String = r.try_get("id").map_err(|e| ApiError::Internal(e.to_string()))?;
                Uuid::parse_str(&id).map_err(|e| ApiError::Internal(e.to_string()))
            })
            .collect()
    }

    async fn bulk_update_scores(&self, updates: &[ScoreUpdate]) -> Result<(), ApiError> {
        let mut tx = self.pool.writer.begin().await.map_err(|e| ApiError::Transient(e.to_string()))?;
        for u in updates {
            sqlx::query("UPDATE skills SET trending_score = ? WHERE id = ?")
                .bind(u.trending_score)
                .bind(u.skill_id.to_string())
                .execute(&mut *tx)
                .await
                .map_err(|e| ApiError::Transient(e.to_string()))?;
        }
        tx.commit().await.map_err(|e| ApiError::Transient(e.to_string()))?;
        Ok(())
    }

    async fn get_star_snapshots(&self, skill_id: Uuid) -> Result<Vec<StarSnapshot>, ApiError> {
        let row = sqlx::query("SELECT star_snapshots FROM skills WHERE id = ?")
            .bind(skill_id.to_string())
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(|e| ApiError::Transient(e.to_string()))?;
        match row {
            Some(row) => {
                let raw: String = row.try_get("star_snapshots").map_err(|e| ApiError::Internal(e.to_string()))?;
                parse_snapshots(&raw)
            }
            None => Err(ApiError::NotFound),
        }
    }

    async fn update_snapshot_and_stats(
        &self,
        skill_id: Uuid,
        stars: i64,
        forks: i64,
        last_commit_at: Option<DateTime<Utc>>,
        snapshots: &[StarSnapshot],
        trending_score: f64,
        now: DateTime<Utc>,
    ) -> Result<(), ApiError> {
        let snapshots_json = format_snapshots(snapshots)?;
        let result = sqlx::query(
            "UPDATE skills SET stars = ?, forks = ?, last_commit_at = ?, star_snapshots = ?, trending_score = ?, updated_at = ? WHERE id = ?",
        )
        .bind(stars)
        .bind(forks)
        .bind(last_commit_at.as_ref().map(format_datetime))
        .bind(snapshots_json)
        .bind(trending_score)
        .bind(format_datetime(&now))
        .bind(skill_id.to_string())
        .execute(&self.pool.writer)
        .await
        .map_err(|e| ApiError::Transient(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(ApiError::NotFound);
        }
        Ok(())
    }

    async fn mark_archived_by_coordinate(&self, repo_owner: &str, repo_name: &str) -> Result<(), ApiError> {
        sqlx::query("UPDATE skills SET tier = 'archived' WHERE repo_owner = ? AND repo_name = ? AND source_type = 'hosted'")
            .bind(repo_owner)
            .bind(repo_name)
            .execute(&self.pool.writer)
            .await
            .map_err(|e| ApiError::Transient(e.to_string()))?;
        Ok(())
    }

    async fn set_tier(&self, skill_id: Uuid, tier: Tier, now: DateTime<Utc>) -> Result<(), ApiError> {
        let result = sqlx::query("UPDATE skills SET tier = ?, updated_at = ? WHERE id = ?")
            .bind(tier_to_str(tier))
            .bind(format_datetime(&now))
            .bind(skill_id.to_string())
            .execute(&self.pool.writer)
            .await
            .map_err(|e| ApiError::Transient(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(ApiError::NotFound);
        }
        Ok(())
    }

    async fn set_last_ingest_error(&self, skill_id: Uuid, error: &str) -> Result<(), ApiError> {
        sqlx::query("UPDATE skills SET last_ingest_error = ? WHERE id = ?")
            .bind(error)
            .bind(skill_id.to_string())
            .execute(&self.pool.writer)
            .await
            .map_err(|e| ApiError::Transient(e.to_string()))?;
        Ok(())
    }

    async fn record_user_action(
        &self,
        user_id: Option<Uuid>,
        subject_ip: Option<&str>,
        skill_id: Uuid,
        action: UserActionKind,
    ) -> Result<UserAction, ApiError> {
        let id = Uuid::new_v4();
        let now = Utc::now();
        let action_str = match action {
            UserActionKind::Download => "download",
            UserActionKind::View => "view",
        };

        sqlx::query("INSERT INTO user_actions (id, user_id, subject_ip, skill_id, action, created_at) VALUES (?, ?, ?, ?, ?, ?)")
            .bind(id.to_string())
            .bind(user_id.map(|u| u.to_string()))
            .bind(subject_ip)
            .bind(skill_id.to_string())
            .bind(action_str)
            .bind(format_datetime(&now))
            .execute(&self.pool.writer)
            .await
            .map_err(|e| ApiError::Transient(e.to_string()))?;

        Ok(UserAction {
            id,
            user_id,
            subject_ip: subject_ip.map(String::from),
            skill_id,
            action,
            created_at: now,
        })
    }
}

impl SqliteSkillRepository {
    async fn list_public_ordered(&self, order_by: &str, limit: i64) -> Result<Vec<Skill>, ApiError> {
        let sql = format!("SELECT * FROM skills WHERE visibility = 'public' AND tier != 'archived' ORDER BY {order_by} LIMIT ?");
        let rows = sqlx::query(&sql)
            .bind(limit)
            .fetch_all(&self.pool.reader)
            .await
            .map_err(|e| ApiError::Transient(e.to_string()))?;
        let mut skills = Vec::with_capacity(rows.len());
        for row in &rows {
            skills.push(SkillRow::from_row(row).map_err(|e| ApiError::Internal(e.to_string()))?.into_skill()?);
        }
        Ok(skills)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skillreg_types::auth::TokenScope;

    async fn test_pool() -> DatabasePool {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let url = format!("sqlite://{}?mode=rwc", db_path.display());
        std::mem::forget(dir);
        DatabasePool::new(&url).await.unwrap()
    }

    fn make_skill(owner: &str, repo: &str, visibility: Visibility) -> Skill {
        let now = Utc::now();
        Skill {
            id: Uuid::new_v4(),
            slug: skillreg_types::skill::compute_slug(owner, repo, None),
            name: format!("{repo} skill"),
            description: "does things".into(),
            repo_owner: owner.into(),
            repo_name: repo.into(),
            skill_path: String::new(),
            github_url: format!("https://github.com/{owner}/{repo}"),
            stars: 10,
            forks: 1,
            trending_score: 5.0,
            indexed_at: now,
            updated_at: now,
            last_commit_at: None,
            readme: None,
            file_structure: None,
            star_snapshots: vec![],
            visibility,
            source_type: SourceType::Hosted,
            tier: Tier::Hot,
            owner_id: None,
            org_id: None,
            content_hash: "sha256:abc".into(),
            last_ingest_error: None,
        }
    }

    #[tokio::test]
    async fn insert_then_find_by_slug() {
        let repo = SqliteSkillRepository::new(test_pool().await);
        let skill = make_skill("acme", "widget", Visibility::Public);
        repo.upsert_skill(&skill, true).await.unwrap();

        let found = repo.find_skill_by_slug(&skill.slug, &Accessor::anonymous()).await.unwrap().unwrap();
        assert_eq!(found.name, skill.name);
    }

    #[tokio::test]
    async fn duplicate_slug_is_conflict() {
        let repo = SqliteSkillRepository::new(test_pool().await);
        let skill = make_skill("acme", "widget", Visibility::Public);
        let mut dup = make_skill("acme", "widget", Visibility::Public);
        dup.id = Uuid::new_v4();

        repo.upsert_skill(&skill, true).await.unwrap();
        let err = repo.upsert_skill(&dup, true).await.unwrap_err();
        assert!(matches!(err, ApiError::Conflict(_)));
    }

    #[tokio::test]
    async fn private_skill_hidden_from_anonymous_direct_lookup() {
        let repo = SqliteSkillRepository::new(test_pool().await);
        let skill = make_skill("acme", "secret", Visibility::Private);
        repo.upsert_skill(&skill, true).await.unwrap();

        let found = repo.find_skill_by_slug(&skill.slug, &Accessor::anonymous()).await.unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn private_skill_visible_to_owner() {
        let repo = SqliteSkillRepository::new(test_pool().await);
        let owner = Uuid::new_v4();
        let mut skill = make_skill("acme", "secret", Visibility::Private);
        skill.owner_id = Some(owner);
        repo.upsert_skill(&skill, true).await.unwrap();

        let accessor = Accessor { user_id: Some(owner), org_ids: vec![], scopes: vec![TokenScope::Read] };
        let found = repo.find_skill_by_slug(&skill.slug, &accessor).await.unwrap();
        assert!(found.is_some());
    }

    #[tokio::test]
    async fn search_excludes_private_for_anonymous() {
        let repo = SqliteSkillRepository::new(test_pool().await);
        repo.upsert_skill(&make_skill("acme", "pub", Visibility::Public), true).await.unwrap();
        repo.upsert_skill(&make_skill("acme", "priv", Visibility::Private), true).await.unwrap();

        let params = SearchParams { limit: 10, offset: 0, ..Default::default() };
        let results = repo.search_skills(&params).await.unwrap();
        assert_eq!(results.total, 1);
        assert_eq!(results.skills[0].repo_name, "pub");
    }

    #[tokio::test]
    async fn list_active_ids_excludes_archived() {
        let repo = SqliteSkillRepository::new(test_pool().await);
        let hot = make_skill("acme", "hot", Visibility::Public);
        let mut archived = make_skill("acme", "dead", Visibility::Public);
        archived.tier = Tier::Archived;
        repo.upsert_skill(&hot, true).await.unwrap();
        repo.upsert_skill(&archived, true).await.unwrap();

        let ids = repo.list_active_ids().await.unwrap();
        assert_eq!(ids, vec![hot.id]);
    }

    #[tokio::test]
    async fn list_archived_ids_returns_only_archived() {
        let repo = SqliteSkillRepository::new(test_pool().await);
        let hot = make_skill("acme", "live", Visibility::Public);
        let mut archived = make_skill("acme", "gone", Visibility::Public);
        archived.tier = Tier::Archived;
        repo.upsert_skill(&hot, true).await.unwrap();
        repo.upsert_skill(&archived, true).await.unwrap();

        let ids = repo.list_archived_ids().await.unwrap();
        assert_eq!(ids, vec![archived.id]);
    }

    #[tokio::test]
    async fn mark_archived_by_coordinate_affects_hosted_rows() {
        let repo = SqliteSkillRepository::new(test_pool().await);
        let skill = make_skill("acme", "gone", Visibility::Public);
        repo.upsert_skill(&skill, true).await.unwrap();

        repo.mark_archived_by_coordinate("acme", "gone").await.unwrap();
        let found = repo.find_skill_by_id(skill.id).await.unwrap().unwrap();
        assert_eq!(found.tier, Tier::Archived);
    }

    #[tokio::test]
    async fn set_tier_updates_row() {
        let repo = SqliteSkillRepository::new(test_pool().await);
        let skill = make_skill("acme", "cools", Visibility::Public);
        repo.upsert_skill(&skill, true).await.unwrap();

        repo.set_tier(skill.id, Tier::Cold, Utc::now()).await.unwrap();
        let found = repo.find_skill_by_id(skill.id).await.unwrap().unwrap();
        assert_eq!(found.tier, Tier::Cold);
    }

    #[tokio::test]
    async fn record_user_action_persists() {
        let repo = SqliteSkillRepository::new(test_pool().await);
        let skill = make_skill("acme", "dl", Visibility::Public);
        repo.upsert_skill(&skill, true).await.unwrap();

        let action = repo.record_user_action(None, Some("1.2.3.4"), skill.id, UserActionKind::Download).await.unwrap();
        assert_eq!(action.skill_id, skill.id);
        assert_eq!(action.action, UserActionKind::Download);
    }
}
