//! SQLite-backed `FavoriteRepository` (§4.10). Add/remove are idempotent.

use chrono::Utc;
use skillreg_core::repository::favorite::FavoriteRepository;
use skillreg_types::error::ApiError;
use sqlx::Row;
use uuid::Uuid;

use super::pool::DatabasePool;

pub struct SqliteFavoriteRepository {
    pool: DatabasePool,
}

impl SqliteFavoriteRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

impl FavoriteRepository for SqliteFavoriteRepository {
    async fn add(&self, user_id: Uuid, skill_id: Uuid) -> Result<(), ApiError> {
        sqlx::query("INSERT INTO favorites (user_id, skill_id, created_at) VALUES (?, ?, ?) ON CONFLICT DO NOTHING")
            .bind(user_id.to_string())
            .bind(skill_id.to_string())
            .bind(Utc::now().to_rfc3339())
            .execute(&self.pool.writer)
            .await
            .map_err(|e| ApiError::Transient(e.to_string()))?;
        Ok(())
    }

    async fn remove(&self, user_id: Uuid, skill_id: Uuid) -> Result<(), ApiError> {
        sqlx::query("DELETE FROM favorites WHERE user_id = ? AND skill_id = ?")
            .bind(user_id.to_string())
            .bind(skill_id.to_string())
            .execute(&self.pool.writer)
            .await
            .map_err(|e| ApiError::Transient(e.to_string()))?;
        Ok(())
    }

    async fn is_favorited(&self, user_id: Uuid, skill_id: Uuid) -> Result<bool, ApiError> {
        let row = sqlx::query("SELECT 1 AS present FROM favorites WHERE user_id = ? AND skill_id = ?")
            .bind(user_id.to_string())
            .bind(skill_id.to_string())
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

    async fn seed_user_and_skill(pool: &DatabasePool) -> (Uuid, Uuid) {
        let user_id = Uuid::new_v4();
        let skill_id = Uuid::new_v4();
        sqlx::query("INSERT INTO user_accounts (id, username, created_at) VALUES (?, ?, ?)")
            .bind(user_id.to_string())
            .bind("tester")
            .bind(Utc::now().to_rfc3339())
            .execute(&pool.writer)
            .await
            .unwrap();
        sqlx::query(
            "INSERT INTO skills (id, slug, name, description, repo_owner, repo_name, github_url, indexed_at, updated_at, content_hash)
             VALUES (?, 'acme-widget', 'Widget', 'd', 'acme', 'widget', 'https://x', ?, ?, 'sha256:x')",
        )
        .bind(skill_id.to_string())
        .bind(Utc::now().to_rfc3339())
        .bind(Utc::now().to_rfc3339())
        .execute(&pool.writer)
        .await
        .unwrap();
        (user_id, skill_id)
    }

    #[tokio::test]
    async fn add_then_is_favorited() {
        let pool = test_pool().await;
        let (user_id, skill_id) = seed_user_and_skill(&pool).await;
        let repo = SqliteFavoriteRepository::new(pool);

        repo.add(user_id, skill_id).await.unwrap();
        assert!(repo.is_favorited(user_id, skill_id).await.unwrap());
    }

    #[tokio::test]
    async fn adding_twice_is_idempotent() {
        let pool = test_pool().await;
        let (user_id, skill_id) = seed_user_and_skill(&pool).await;
        let repo = SqliteFavoriteRepository::new(pool);

        repo.add(user_id, skill_id).await.unwrap();
        repo.add(user_id, skill_id).await.unwrap();
        assert!(repo.is_favorited(user_id, skill_id).await.unwrap());
    }

    #[tokio::test]
    async fn removing_missing_favorite_is_ok() {
        let pool = test_pool().await;
        let (user_id, skill_id) = seed_user_and_skill(&pool).await;
        let repo = SqliteFavoriteRepository::new(pool);

        repo.remove(user_id, skill_id).await.unwrap();
        assert!(!repo.is_favorited(user_id, skill_id).await.unwrap());
    }
}
