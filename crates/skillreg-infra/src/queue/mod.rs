//! SQLite-backed `Queue<T>` (C4/C5 glue, §4.2/§5). A job's "invisible
//! until ack/nack" window is a single in-flight row per `queue_name`;
//! each `SqliteQueue` handle tracks the one delivery it currently holds,
//! so callers must ack/nack before dequeuing again from the same handle.

use std::marker::PhantomData;
use std::time::Duration;

use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use skillreg_core::queue::{Delivery, Queue, QueueError};
use sqlx::Row;
use tokio::sync::Mutex;

use crate::sqlite::pool::DatabasePool;

struct Lease {
    row_id: i64,
    attempt: u32,
}

pub struct SqliteQueue<T> {
    pool: DatabasePool,
    queue_name: String,
    lease: Mutex<Option<Lease>>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> SqliteQueue<T> {
    pub fn new(pool: DatabasePool, queue_name: impl Into<String>) -> Self {
        Self { pool, queue_name: queue_name.into(), lease: Mutex::new(None), _marker: PhantomData }
    }
}

impl<T> Queue<T> for SqliteQueue<T>
where
    T: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    async fn enqueue(&self, job: T) -> Result<(), QueueError> {
        let payload = serde_json::to_string(&job).map_err(|e| QueueError::Store(e.to_string()))?;
        sqlx::query("INSERT INTO jobs (queue_name, payload) VALUES (?, ?)")
            .bind(&self.queue_name)
            .bind(payload)
            .execute(&self.pool.writer)
            .await
            .map_err(|e| QueueError::Store(e.to_string()))?;
        Ok(())
    }

    async fn dequeue(&self) -> Result<Option<Delivery<T>>, QueueError> {
        let mut lease = self.lease.lock().await;
        if lease.is_some() {
            return Err(QueueError::Store("dequeue called with an unacked delivery outstanding".into()));
        }

        let mut tx = self.pool.writer.begin().await.map_err(|e| QueueError::Store(e.to_string()))?;
        let now = Utc::now().to_rfc3339();

        let row = sqlx::query(
            "SELECT id, payload, attempt FROM jobs
             WHERE queue_name = ? AND status = 'ready' AND available_at <= ?
             ORDER BY id LIMIT 1",
        )
        .bind(&self.queue_name)
        .bind(&now)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| QueueError::Store(e.to_string()))?;

        let Some(row) = row else {
            tx.commit().await.map_err(|e| QueueError::Store(e.to_string()))?;
            return Ok(None);
        };

        let row_id: i64 = row.try_get("id").map_err(|e| QueueError::Store(e.to_string()))?;
        let payload: String = row.try_get("payload").map_err(|e| QueueError::Store(e.to_string()))?;
        let attempt: i64 = row.try_get("attempt").map_err(|e| QueueError::Store(e.to_string()))?;

        sqlx::query("UPDATE jobs SET status = 'in_flight' WHERE id = ?")
            .bind(row_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| QueueError::Store(e.to_string()))?;

        tx.commit().await.map_err(|e| QueueError::Store(e.to_string()))?;

        let job: T = serde_json::from_str(&payload).map_err(|e| QueueError::Store(e.to_string()))?;
        let attempt = attempt as u32;
        *lease = Some(Lease { row_id, attempt });

        Ok(Some(Delivery { job, attempt }))
    }

    async fn ack(&self, attempt: u32) -> Result<(), QueueError> {
        let mut lease = self.lease.lock().await;
        let held = lease
            .take()
            .ok_or_else(|| QueueError::Store("ack called with no outstanding delivery".into()))?;
        if held.attempt != attempt {
            *lease = Some(held);
            return Err(QueueError::Store("ack attempt does not match the outstanding delivery".into()));
        }

        sqlx::query("DELETE FROM jobs WHERE id = ?")
            .bind(held.row_id)
            .execute(&self.pool.writer)
            .await
            .map_err(|e| QueueError::Store(e.to_string()))?;
        Ok(())
    }

    async fn nack(&self, attempt: u32, delay: Duration, max_attempts: u32) -> Result<(), QueueError> {
        let mut lease = self.lease.lock().await;
        let held = lease
            .take()
            .ok_or_else(|| QueueError::Store("nack called with no outstanding delivery".into()))?;
        if held.attempt != attempt {
            *lease = Some(held);
            return Err(QueueError::Store("nack attempt does not match the outstanding delivery".into()));
        }

        let next_attempt = held.attempt + 1;
        if next_attempt >= max_attempts {
            sqlx::query("UPDATE jobs SET status = 'dead', attempt = ? WHERE id = ?")
                .bind(next_attempt as i64)
                .bind(held.row_id)
                .execute(&self.pool.writer)
                .await
                .map_err(|e| QueueError::Store(e.to_string()))?;
            return Ok(());
        }

        let available_at = (Utc::now() + chrono::Duration::from_std(delay).unwrap_or_default()).to_rfc3339();
        sqlx::query("UPDATE jobs SET status = 'ready', attempt = ?, available_at = ? WHERE id = ?")
            .bind(next_attempt as i64)
            .bind(available_at)
            .bind(held.row_id)
            .execute(&self.pool.writer)
            .await
            .map_err(|e| QueueError::Store(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
    struct Job {
        path: String,
    }

    async fn test_pool() -> DatabasePool {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let url = format!("sqlite://{}?mode=rwc", db_path.display());
        std::mem::forget(dir);
        DatabasePool::new(&url).await.unwrap()
    }

    #[tokio::test]
    async fn enqueue_then_dequeue_roundtrip() {
        let queue: SqliteQueue<Job> = SqliteQueue::new(test_pool().await, "discovery");
        queue.enqueue(Job { path: "acme/widget".into() }).await.unwrap();

        let delivery = queue.dequeue().await.unwrap().unwrap();
        assert_eq!(delivery.job, Job { path: "acme/widget".into() });
        assert_eq!(delivery.attempt, 0);
    }

    #[tokio::test]
    async fn empty_queue_returns_none() {
        let queue: SqliteQueue<Job> = SqliteQueue::new(test_pool().await, "discovery");
        assert!(queue.dequeue().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn acked_job_does_not_redeliver() {
        let queue: SqliteQueue<Job> = SqliteQueue::new(test_pool().await, "discovery");
        queue.enqueue(Job { path: "a".into() }).await.unwrap();
        let delivery = queue.dequeue().await.unwrap().unwrap();
        queue.ack(delivery.attempt).await.unwrap();
        assert!(queue.dequeue().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn nacked_job_redelivers_with_incremented_attempt() {
        let queue: SqliteQueue<Job> = SqliteQueue::new(test_pool().await, "discovery");
        queue.enqueue(Job { path: "a".into() }).await.unwrap();
        let delivery = queue.dequeue().await.unwrap().unwrap();
        queue.nack(delivery.attempt, Duration::from_secs(0), 5).await.unwrap();

        let redelivered = queue.dequeue().await.unwrap().unwrap();
        assert_eq!(redelivered.attempt, 1);
    }

    #[tokio::test]
    async fn nack_past_max_attempts_moves_job_to_dead_letter() {
        let queue: SqliteQueue<Job> = SqliteQueue::new(test_pool().await, "discovery");
        queue.enqueue(Job { path: "a".into() }).await.unwrap();
        let delivery = queue.dequeue().await.unwrap().unwrap();
        queue.nack(delivery.attempt, Duration::from_secs(0), 1).await.unwrap();

        assert!(queue.dequeue().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn nacked_job_with_delay_is_not_immediately_ready() {
        let queue: SqliteQueue<Job> = SqliteQueue::new(test_pool().await, "discovery");
        queue.enqueue(Job { path: "a".into() }).await.unwrap();
        let delivery = queue.dequeue().await.unwrap().unwrap();
        queue.nack(delivery.attempt, Duration::from_secs(60), 5).await.unwrap();

        assert!(queue.dequeue().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn separate_queue_names_do_not_interfere() {
        let pool = test_pool().await;
        let discovery: SqliteQueue<Job> = SqliteQueue::new(pool.clone(), "discovery");
        let indexing: SqliteQueue<Job> = SqliteQueue::new(pool, "indexing");

        discovery.enqueue(Job { path: "a".into() }).await.unwrap();
        assert!(indexing.dequeue().await.unwrap().is_none());
        assert!(discovery.dequeue().await.unwrap().is_some());
    }
}
