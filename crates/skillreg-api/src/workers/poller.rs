//! Event Poller (C4, §4.4). Walks the source host's public event firehose
//! newest-first, stopping at the last event id seen on a prior cycle, and
//! enqueues one indexing job per distinct `(owner, repo)` touched by a
//! `PushEvent`.

use std::time::Duration;

use skillreg_core::queue::Queue;
use skillreg_core::repository::kv::KvStore;
use skillreg_core::source_host::SourceHostClient;
use skillreg_types::error::ApiError;
use tracing::{debug, info};

use crate::state::IndexJob;

const LAST_EVENT_ID_KEY: &str = "github-events:last-event-id";
const PROCESSED_TTL: Duration = Duration::from_secs(7 * 24 * 3600);
const MAX_PAGES: u32 = 10;

/// Runs one poll cycle, returning the number of indexing jobs enqueued.
pub async fn poll_once<H, Q, K>(host: &H, queue: &Q, kv: &K) -> Result<usize, ApiError>
where
    H: SourceHostClient,
    Q: Queue<IndexJob>,
    K: KvStore,
{
    let last_event_id = kv.get(LAST_EVENT_ID_KEY).await?;
    let mut newest_seen: Option<String> = None;
    let mut enqueued = 0usize;

    'pages: for page in 1..=MAX_PAGES {
        let events = host
            .list_events(page)
            .await
            .map_err(|e| ApiError::UpstreamUnavailable(e.to_string()))?;
        if events.is_empty() {
            break;
        }

        for event in &events {
            if newest_seen.is_none() {
                newest_seen = Some(event.id.clone());
            }
            if last_event_id.as_deref() == Some(event.id.as_str()) {
                break 'pages;
            }
            if event.event_type != "PushEvent" {
                continue;
            }

            let processed_key = format!("github-events:processed:{}", event.id);
            if kv.exists(&processed_key).await? {
                continue;
            }

            queue
                .enqueue(IndexJob {
                    owner: event.repo_owner.clone(),
                    repo: event.repo_name.clone(),
                    event_id: Some(event.id.clone()),
                })
                .await
                .map_err(|e| ApiError::Internal(e.to_string()))?;
            kv.set(&processed_key, "1", Some(PROCESSED_TTL)).await?;
            enqueued += 1;
            debug!(owner = %event.repo_owner, repo = %event.repo_name, event_id = %event.id, "enqueued index job");
        }
    }

    if let Some(newest) = newest_seen {
        kv.set(LAST_EVENT_ID_KEY, &newest, None).await?;
    }

    info!(enqueued, "poll cycle complete");
    Ok(enqueued)
}
