//! SQLite-backed `KvStore` (C1, §5). The writer pool's single connection
//! already serializes every call, so lock acquisition and counter
//! increments only need a transaction to group their read-then-write
//! pair, not a separate advisory lock.

use std::time::Duration;

use chrono::{DateTime, Utc};
use skillreg_core::repository::kv::KvStore;
use skillreg_types::error::ApiError;
use sqlx::Row;

use super::pool::DatabasePool;

pub struct SqliteKvStore {
    pool: DatabasePool,
}

impl SqliteKvStore {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

fn parse_datetime(s: &str) -> Result<DateTime<Utc>, ApiError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| ApiError::Internal(format!("invalid datetime in kv_store: {e}")))
}

impl KvStore for SqliteKvStore {
    async fn get(&self, key: &str) -> Result<Option<String>, ApiError> {
        let now = Utc::now().to_rfc3339();
        let row = sqlx::query(
            "SELECT value FROM kv_store WHERE key = ? AND (expires_at IS NULL OR expires_at > ?)",
        )
        .bind(key)
        .bind(&now)
        .fetch_optional(&self.pool.reader)
        .await
        .map_err(|e| ApiError::Transient(e.to_string()))?;

        match row {
            Some(row) => {
                let value: String = row.try_get("value").map_err(|e| ApiError::Internal(e.to_string()))?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), ApiError> {
        let now = Utc::now();
        let expires_at = ttl.map(|d| (now + chrono::Duration::from_std(d).unwrap_or_default()).to_rfc3339());

        sqlx::query(
            "INSERT INTO kv_store (key, value, expires_at, created_at, updated_at) VALUES (?, ?, ?, ?, ?)
             ON CONFLICT (key) DO UPDATE SET value = excluded.value, expires_at = excluded.expires_at, updated_at = excluded.updated_at",
        )
        .bind(key)
        .bind(value)
        .bind(expires_at)
        .bind(now.to_rfc3339())
        .bind(now.to_rfc3339())
        .execute(&self.pool.writer)
        .await
        .map_err(|e| ApiError::Transient(e.to_string()))?;

        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), ApiError> {
        sqlx::query("DELETE FROM kv_store WHERE key = ?")
            .bind(key)
            .execute(&self.pool.writer)
            .await
            .map_err(|e| ApiError::Transient(e.to_string()))?;
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool, ApiError> {
        Ok(self.get(key).await?.is_some())
    }

    async fn list_prefix(&self, prefix: &str) -> Result<Vec<String>, ApiError> {
        let now = Utc::now().to_rfc3339();
        let like_pattern = format!("{}%", prefix.replace('%', "\\%").replace('_', "\\_"));
        let rows = sqlx::query(
            "SELECT key FROM kv_store WHERE key LIKE ? ESCAPE '\\' AND (expires_at IS NULL OR expires_at > ?) ORDER BY key",
        )
        .bind(like_pattern)
        .bind(&now)
        .fetch_all(&self.pool.reader)
        .await
        .map_err(|e| ApiError::Transient(e.to_string()))?;

        let mut keys = Vec::with_capacity(rows.len());
        for row in &rows {
            keys.push(row.try_get("key").map_err(|e| ApiError::Internal(e.to_string()))?);
        }
        Ok(keys)
    }

    async fn try_acquire_lock(&self, key: &str, ttl: Duration) -> Result<bool, ApiError> {
        let now = Utc::now();
        let mut tx = self.pool.writer.begin().await.map_err(|e| ApiError::Transient(e.to_string()))?;

        let existing: Option<(String,)> = sqlx::query_as("SELECT expires_at FROM kv_store WHERE key = ?")
            .bind(key)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| ApiError::Transient(e.to_string()))?;

        if let Some((exp,)) = existing {
            if exp > now.to_rfc3339() {
                return Ok(false);
            }
        }

        let expires_at = (now + chrono::Duration::from_std(ttl).unwrap_or_default()).to_rfc3339();
        sqlx::query(
            "INSERT INTO kv_store (key, value, expires_at, created_at, updated_at) VALUES (?, 'locked', ?, ?, ?)
             ON CONFLICT (key) DO UPDATE SET value = 'locked', expires_at = excluded.expires_at, updated_at = excluded.updated_at",
        )
        .bind(key)
        .bind(&expires_at)
        .bind(now.to_rfc3339())
        .bind(now.to_rfc3339())
        .execute(&mut *tx)
        .await
        .map_err(|e| ApiError::Transient(e.to_string()))?;

        tx.commit().await.map_err(|e| ApiError::Transient(e.to_string()))?;
        Ok(true)
    }

    async fn release_lock(&self, key: &str) -> Result<(), ApiError> {
        self.delete(key).await
    }

    async fn increment_counter(&self, key: &str, window: Duration) -> Result<u64, ApiError> {
        let now = Utc::now();
        let mut tx = self.pool.writer.begin().await.map_err(|e| ApiError::Transient(e.to_string()))?;

        let existing: Option<(String, String)> = sqlx::query_as("SELECT value, expires_at FROM kv_store WHERE key = ?")
            .bind(key)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| ApiError::Transient(e.to_string()))?;

        let count = match existing {
            Some((value, expires_at)) if expires_at > now.to_rfc3339() => value.parse::<u64>().unwrap_or(0) + 1,
            _ => 1,
        };

        let expires_at = (now + chrono::Duration::from_std(window).unwrap_or_default()).to_rfc3339();
        sqlx::query(
            "INSERT INTO kv_store (key, value, expires_at, created_at, updated_at) VALUES (?, ?, ?, ?, ?)
             ON CONFLICT (key) DO UPDATE SET value = excluded.value, expires_at = excluded.expires_at, updated_at = excluded.updated_at",
        )
        .bind(key)
        .bind(count.to_string())
        .bind(&expires_at)
        .bind(now.to_rfc3339())
        .bind(now.to_rfc3339())
        .execute(&mut *tx)
        .await
        .map_err(|e| ApiError::Transient(e.to_string()))?;

        tx.commit().await.map_err(|e| ApiError::Transient(e.to_string()))?;
        Ok(count)
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
    async fn set_get_roundtrip() {
        let store = SqliteKvStore::new(test_pool().await);
        store.set("foo", "bar", None).await.unwrap();
        assert_eq!(store.get("foo").await.unwrap(), Some("bar".to_string()));
    }

    #[tokio::test]
    async fn expired_entry_reads_as_absent() {
        let store = SqliteKvStore::new(test_pool().await);
        store.set("short", "v", Some(Duration::from_millis(1))).await.unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(store.get("short").await.unwrap(), None);
    }

    #[tokio::test]
    async fn list_prefix_filters_and_excludes_expired() {
        let store = SqliteKvStore::new(test_pool().await);
        store.set("needs_update:a", "1", None).await.unwrap();
        store.set("needs_update:b", "1", None).await.unwrap();
        store.set("other:c", "1", None).await.unwrap();
        let mut keys = store.list_prefix("needs_update:").await.unwrap();
        keys.sort();
        assert_eq!(keys, vec!["needs_update:a", "needs_update:b"]);
    }

    #[tokio::test]
    async fn lock_is_exclusive_until_released() {
        let store = SqliteKvStore::new(test_pool().await);
        assert!(store.try_acquire_lock("lock:x", Duration::from_secs(60)).await.unwrap());
        assert!(!store.try_acquire_lock("lock:x", Duration::from_secs(60)).await.unwrap());
        store.release_lock("lock:x").await.unwrap();
        assert!(store.try_acquire_lock("lock:x", Duration::from_secs(60)).await.unwrap());
    }

    #[tokio::test]
    async fn lock_can_be_reacquired_after_ttl_expiry() {
        let store = SqliteKvStore::new(test_pool().await);
        assert!(store.try_acquire_lock("lock:y", Duration::from_millis(1)).await.unwrap());
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(store.try_acquire_lock("lock:y", Duration::from_secs(60)).await.unwrap());
    }

    #[tokio::test]
    async fn counter_increments_within_window() {
        let store = SqliteKvStore::new(test_pool().await);
        assert_eq!(store.increment_counter("ratelimit:a", Duration::from_secs(60)).await.unwrap(), 1);
        assert_eq!(store.increment_counter("ratelimit:a", Duration::from_secs(60)).await.unwrap(), 2);
        assert_eq!(store.increment_counter("ratelimit:a", Duration::from_secs(60)).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn counter_resets_after_window_expiry() {
        let store = SqliteKvStore::new(test_pool().await);
        store.increment_counter("ratelimit:b", Duration::from_millis(1)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(store.increment_counter("ratelimit:b", Duration::from_secs(60)).await.unwrap(), 1);
    }
}
