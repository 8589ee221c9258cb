//! `skregd status`: a quick operational snapshot without touching any port
//! trait -- this is an operator tool, not a code path the core cares about.

use serde::Serialize;
use sqlx::Row;

use crate::state::AppState;

#[derive(Debug, Serialize)]
struct QueueDepth {
    queue_name: String,
    ready: i64,
    in_flight: i64,
    dead: i64,
}

#[derive(Debug, Serialize)]
struct StatusReport {
    queues: Vec<QueueDepth>,
    last_event_id: Option<String>,
}

pub async fn run(state: &AppState, json: bool) -> anyhow::Result<()> {
    let rows = sqlx::query(
        "SELECT queue_name, status, COUNT(*) as n FROM jobs GROUP BY queue_name, status",
    )
    .fetch_all(&state.db_pool.reader)
    .await?;

    let mut queues: std::collections::BTreeMap<String, QueueDepth> = std::collections::BTreeMap::new();
    for row in &rows {
        let queue_name: String = row.try_get("queue_name")?;
        let status: String = row.try_get("status")?;
        let n: i64 = row.try_get("n")?;
        let entry = queues.entry(queue_name.clone()).or_insert(QueueDepth {
            queue_name,
            ready: 0,
            in_flight: 0,
            dead: 0,
        });
        match status.as_str() {
            "ready" => entry.ready = n,
            "in_flight" => entry.in_flight = n,
            "dead" => entry.dead = n,
            _ => {}
        }
    }

    let last_event_id = skillreg_core::repository::kv::KvStore::get(&*state.kv, "github-events:last-event-id").await?;

    let report = StatusReport { queues: queues.into_values().collect(), last_event_id };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("last processed github event: {}", report.last_event_id.as_deref().unwrap_or("<none>"));
        for q in &report.queues {
            println!("{:<12} ready={:<6} in_flight={:<6} dead={:<6}", q.queue_name, q.ready, q.in_flight, q.dead);
        }
    }
    Ok(())
}
