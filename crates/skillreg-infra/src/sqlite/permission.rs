//! SQLite-backed `PermissionRepository` (§4.9).

use chrono::{DateTime, Utc};
use skillreg_core::repository::permission::PermissionRepository;
use skillreg_types::error::ApiError;
use skillreg_types::permission::{GranteeType, SkillPermission};
use sqlx::Row;
use uuid::Uuid;

use super::pool::DatabasePool;

pub struct SqlitePermissionRepository {
    pool: DatabasePool,
}

impl SqlitePermissionRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

fn grantee_type_from_str(s: &str) -> Result<GranteeType, ApiError> {
    match s {
        "user" => Ok(GranteeType::User),
        "org" => Ok(GranteeType::Org),
        other => Err(ApiError::Internal(format!("unknown grantee_type: {other}"))),
    }
}

fn parse_datetime(s: &str) -> Result<DateTime<Utc>, ApiError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| ApiError::Internal(format!("invalid datetime in skill_permissions: {e}")))
}

impl PermissionRepository for SqlitePermissionRepository {
    async fn active_grants_for_skill(&self, skill_id: Uuid) -> Result<Vec<SkillPermission>, ApiError> {
        let rows = sqlx::query(
            "SELECT * FROM skill_permissions WHERE skill_id = ? AND (expires_at IS NULL OR expires_at > datetime('now'))",
        )
        .bind(skill_id.to_string())
        .fetch_all(&self.pool.reader)
        .await
        .map_err(|e| ApiError::Transient(e.to_string()))?;

        let mut out = Vec::with_capacity(rows.len());
        for row in &rows {
            let grantee_type: String = row.try_get("grantee_type").map_err(|e| ApiError::Internal(e.to_string()))?;
            let grantee_id: String = row.try_get("grantee_id").map_err(|e| ApiError::Internal(e.to_string()))?;
            let expires_at: Option<String> = row.try_get("expires_at").map_err(|e| ApiError::Internal(e.to_string()))?;
            out.push(SkillPermission {
                skill_id,
                grantee_type: grantee_type_from_str(&grantee_type)?,
                grantee_id: Uuid::parse_str(&grantee_id).map_err(|e| ApiError::Internal(e.to_string()))?,
                expires_at: expires_at.as_deref().map(parse_datetime).transpose()?,
            });
        }
        Ok(out)
    }

    async fn accessible_private_ids(&self, user_id: Uuid) -> Result<Vec<Uuid>, ApiError> {
        let rows = sqlx::query(
            "SELECT id FROM skills WHERE visibility = 'private' AND (
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
            )",
        )
        .bind(user_id.to_string())
        .bind(user_id.to_string())
        .bind(user_id.to_string())
        .bind(user_id.to_string())
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

    async fn is_org_member(&self, user_id: Uuid, org_id: Uuid) -> Result<bool, ApiError> {
        let row = sqlx::query("SELECT 1 AS present FROM org_members WHERE user_id = ? AND org_id = ?")
            .bind(user_id.to_string())
            .bind(org_id.to_string())
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(|e| ApiError::Transient(e.to_string()))?;
        Ok(row.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_pool() -> DatabasePool {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let url = format!("sqlite://{}?mode=rwc", db_path.display());
        std::mem::forget(dir);
        DatabasePool::new(&url).await.unwrap()
    }

    #[tokio::test]
    async fn org_member_lookup_reflects_membership_table() {
        let pool = test_pool().await;
        let user_id = Uuid::new_v4();
        let org_id = Uuid::new_v4();
        sqlx::query("INSERT INTO user_accounts (id, username, created_at) VALUES (?, 'u', ?)")
            .bind(user_id.to_string())
            .bind(Utc::now().to_rfc3339())
            .execute(&pool.writer)
            .await
            .unwrap();
        sqlx::query("INSERT INTO organizations (id, slug, name, created_at) VALUES (?, 'acme', 'Acme', ?)")
            .bind(org_id.to_string())
            .bind(Utc::now().to_rfc3339())
            .execute(&pool.writer)
            .await
            .unwrap();

        let repo = SqlitePermissionRepository::new(pool.clone());
        assert!(!repo.is_org_member(user_id, org_id).await.unwrap());

        sqlx::query("INSERT INTO org_members (org_id, user_id, role) VALUES (?, ?, 'member')")
            .bind(org_id.to_string())
            .bind(user_id.to_string())
            .execute(&pool.writer)
            .await
            .unwrap();

        assert!(repo.is_org_member(user_id, org_id).await.unwrap());
    }

    #[tokio::test]
    async fn expired_grant_excluded_from_active_grants() {
        let pool = test_pool().await;
        let skill_id = Uuid::new_v4();
        let grantee_id = Uuid::new_v4();
        sqlx::query(
            "INSERT INTO skills (id, slug, name, description, repo_owner, repo_name, github_url, indexed_at, updated_at, content_hash, visibility)
             VALUES (?, 'acme-widget', 'Widget', 'd', 'acme', 'widget', 'https://x', ?, ?, 'sha256:x', 'private')",
        )
        .bind(skill_id.to_string())
        .bind(Utc::now().to_rfc3339())
        .bind(Utc::now().to_rfc3339())
        .execute(&pool.writer)
        .await
        .unwrap();
        sqlx::query("INSERT INTO skill_permissions (skill_id, grantee_type, grantee_id, expires_at) VALUES (?, 'user', ?, ?)")
            .bind(skill_id.to_string())
            .bind(grantee_id.to_string())
            .bind((Utc::now() - chrono::Duration::seconds(1)).to_rfc3339())
            .execute(&pool.writer)
            .await
            .unwrap();

        let repo = SqlitePermissionRepository::new(pool);
        let grants = repo.active_grants_for_skill(skill_id).await.unwrap();
        assert!(grants.is_empty());
    }
}
