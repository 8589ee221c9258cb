//! The in-process work queue (C4/C5 glue): discovery results and
//! re-index triggers move from the poller to the indexing workers
//! through this port. The SQLite-backed job table and redelivery policy
//! live in `skillreg-infra`; this module only defines the seam and the
//! pure backoff schedule both sides agree on.

use std::future::Future;
use std::time::Duration;

/// A unit of work pulled off the queue, together with its delivery count
/// so a worker can decide whether to give up.
#[derive(Debug, Clone)]
pub struct Delivery<T> {
    pub job: T,
    pub attempt: u32,
}

/// A durable, at-least-once work queue. Implementations must make a
/// `dequeue`d item invisible until `ack`/`nack`, so a crashed worker's
/// jobs reappear for another worker once the invisibility window lapses.
pub trait Queue<T>: Send + Sync
where
    T: Send + Sync + 'static,
{
    fn enqueue(&self, job: T) -> impl Future<Output = Result<(), QueueError>> + Send;

    /// Pulls the next ready job, if any, marking it in-flight.
    fn dequeue(&self) -> impl Future<Output = Result<Option<Delivery<T>>, QueueError>> + Send;

    /// Marks a delivery done; it will not be redelivered.
    fn ack(&self, attempt: u32) -> impl Future<Output = Result<(), QueueError>> + Send;

    /// Returns a job to the queue for redelivery after `delay`, unless
    /// `attempt` has reached `max_attempts`, in which case it is dropped
    /// to a dead-letter state instead.
    fn nack(
        &self,
        attempt: u32,
        delay: Duration,
        max_attempts: u32,
    ) -> impl Future<Output = Result<(), QueueError>> + Send;
}

#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    #[error("queue store error: {0}")]
    Store(String),
}

/// Exponential backoff with full jitter is an infra concern (needs a
/// CSPRNG); this is the deterministic base schedule both the poller and
/// the indexing worker size their `max_attempts` against (§4.2, §5).
pub fn backoff_delay(attempt: u32, base: Duration, max: Duration) -> Duration {
    let exp = base.saturating_mul(1u32.checked_shl(attempt.min(16)).unwrap_or(u32::MAX));
    exp.min(max)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_grows_then_caps() {
        let base = Duration::from_secs(1);
        let max = Duration::from_secs(30);
        assert_eq!(backoff_delay(0, base, max), Duration::from_secs(1));
        assert_eq!(backoff_delay(1, base, max), Duration::from_secs(2));
        assert_eq!(backoff_delay(2, base, max), Duration::from_secs(4));
        assert_eq!(backoff_delay(10, base, max), max);
    }
}
