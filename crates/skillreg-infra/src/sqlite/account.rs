//! SQLite-backed `UserAccountRepository`.

use chrono::{DateTime, Utc};
use skillreg_core::repository::account::UserAccountRepository;
use skillreg_types::error::ApiError;
use skillreg_types::user::UserAccount;
use sqlx::Row;
use uuid::Uuid;

use super::pool::DatabasePool;

pub struct SqliteUserAccountRepository {
    pool: DatabasePool,
}

impl SqliteUserAccountRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

fn parse_datetime(s: &str) -> Result<DateTime<Utc>, ApiError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| ApiError::Internal(format!("invalid datetime in user_accounts: {e}")))
}

fn row_to_account(row: &sqlx::sqlite::SqliteRow) -> Result<UserAccount, ApiError> {
    let id: String = row.try_get("id").map_err(|e| ApiError::Internal(e.to_string()))?;
    let created_at: String = row.try_get("created_at").map_err(|e| ApiError::Internal(e.to_string()))?;

    Ok(UserAccount {
        id: Uuid::parse_str(&id).map_err(|e| ApiError::Internal(e.to_string()))?,
        username: row.try_get("username").map_err(|e| ApiError::Internal(e.to_string()))?,
        github_id: row.try_get("github_id").map_err(|e| ApiError::Internal(e.to_string()))?,
        created_at: parse_datetime(&created_at)?,
    })
}

impl UserAccountRepository for SqliteUserAccountRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<UserAccount>, ApiError> {
        let row = sqlx::query("SELECT * FROM user_accounts WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(|e| ApiError::Transient(e.to_string()))?;
        row.as_ref().map(row_to_account).transpose()
    }

    async fn upsert(&self, account: &UserAccount) -> Result<(), ApiError> {
        sqlx::query(
            "INSERT INTO user_accounts (id, username, github_id, created_at) VALUES (?, ?, ?, ?)
             ON CONFLICT (id) DO UPDATE SET username = excluded.username, github_id = excluded.github_id",
        )
        .bind(account.id.to_string())
        .bind(&account.username)
        .bind(account.github_id)
        .bind(account.created_at.to_rfc3339())
        .execute(&self.pool.writer)
        .await
        .map_err(|e| ApiError::Transient(e.to_string()))?;
        Ok(())
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
    async fn insert_then_find_by_id() {
        let repo = SqliteUserAccountRepository::new(test_pool().await);
        let account = UserAccount { id: Uuid::new_v4(), username: "acme".into(), github_id: Some(1), created_at: Utc::now() };
        repo.upsert(&account).await.unwrap();

        let found = repo.find_by_id(account.id).await.unwrap().unwrap();
        assert_eq!(found.username, "acme");
    }

    #[tokio::test]
    async fn missing_account_returns_none() {
        let repo = SqliteUserAccountRepository::new(test_pool().await);
        assert!(repo.find_by_id(Uuid::new_v4()).await.unwrap().is_none());
    }
}
