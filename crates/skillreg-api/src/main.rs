//! `skregd`: the skill registry's read API and background workers.

use std::time::Duration;

use clap::Parser;
use clap_complete::generate;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info, warn};

use skillreg_api::cli::{Cli, Commands};
use skillreg_api::state::AppState;
use skillreg_api::{cli, http, workers};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    skillreg_observe::tracing_setup::init_tracing(cli.verbose).map_err(|e| anyhow::anyhow!(e.to_string()))?;

    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        generate(*shell, &mut cmd, "skregd", &mut std::io::stdout());
        return Ok(());
    }

    let state = AppState::init().await?;

    match cli.command {
        Commands::PollOnce => {
            let enqueued = workers::poller::poll_once(&*state.host, &*state.index_queue, &*state.kv).await?;
            print_result(cli.json, "poll_once", serde_json::json!({ "enqueued": enqueued }));
        }
        Commands::Reindex => {
            let mut processed = 0usize;
            while workers::indexing::process_one(&state).await? {
                processed += 1;
            }
            print_result(cli.json, "reindex", serde_json::json!({ "processed": processed }));
        }
        Commands::ClassifyOnce => {
            let mut processed = 0usize;
            while workers::classification::process_one(&state).await? {
                processed += 1;
            }
            print_result(cli.json, "classify_once", serde_json::json!({ "processed": processed }));
        }
        Commands::RankOnce => {
            workers::ranking::run_once(&state).await?;
            print_result(cli.json, "rank_once", serde_json::json!({ "status": "ok" }));
        }
        Commands::LifecycleOnce => {
            workers::lifecycle::run_once(&state).await?;
            print_result(cli.json, "lifecycle_once", serde_json::json!({ "status": "ok" }));
        }
        Commands::Status => {
            cli::status::run(&state, cli.json).await?;
        }
        Commands::Serve { port, host } => {
            serve(state, host, port).await?;
        }
        Commands::Completions { .. } => unreachable!("handled above"),
    }

    Ok(())
}

/// A 6-field cron expression firing every `interval_secs`, in whichever
/// unit (seconds or minutes) the interval fits without truncation to
/// zero.
fn interval_cron(interval_secs: u64) -> String {
    if interval_secs < 60 {
        format!("*/{} * * * * *", interval_secs.max(1))
    } else {
        format!("0 */{} * * * *", (interval_secs / 60).max(1))
    }
}

fn print_result(json: bool, label: &str, value: serde_json::Value) {
    if json {
        println!("{value}");
    } else {
        println!("{label}: {value}");
    }
}

async fn serve(state: AppState, host: String, port: u16) -> anyhow::Result<()> {
    let scheduler = JobScheduler::new().await?;

    let poll_state = state.clone();
    let poll_cron = interval_cron(state.config.poll_interval_secs);
    scheduler
        .add(Job::new_async(poll_cron.as_str(), move |_id, _lock| {
            let state = poll_state.clone();
            Box::pin(async move {
                if let Err(err) = workers::poller::poll_once(&*state.host, &*state.index_queue, &*state.kv).await {
                    warn!(%err, "scheduled poll cycle failed");
                }
            })
        })?)
        .await?;

    let ranking_state = state.clone();
    let ranking_cron = interval_cron(state.config.ranking_interval_secs);
    scheduler
        .add(Job::new_async(ranking_cron.as_str(), move |_id, _lock| {
            let state = ranking_state.clone();
            Box::pin(async move {
                if let Err(err) = workers::ranking::run_once(&state).await {
                    warn!(%err, "scheduled ranking run failed");
                }
                if let Err(err) = workers::lifecycle::run_once(&state).await {
                    warn!(%err, "scheduled lifecycle sweep failed");
                }
            })
        })?)
        .await?;

    scheduler.start().await?;

    let index_state = state.clone();
    tokio::spawn(drain_loop("indexing", move || {
        let state = index_state.clone();
        async move { workers::indexing::process_one(&state).await }
    }));

    let classify_state = state.clone();
    tokio::spawn(drain_loop("classification", move || {
        let state = classify_state.clone();
        async move { workers::classification::process_one(&state).await }
    }));

    let router = http::router::build_router(state);
    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(%addr, "skregd listening");

    axum::serve(listener, router).with_graceful_shutdown(shutdown_signal()).await?;
    Ok(())
}

/// Repeatedly drains a queue, sleeping briefly when it's empty rather than
/// busy-spinning; errors are logged and treated the same as "empty" so one
/// bad job can't wedge the loop.
async fn drain_loop<F, Fut>(name: &'static str, mut step: F)
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: std::future::Future<Output = Result<bool, skillreg_types::error::ApiError>> + Send,
{
    loop {
        match step().await {
            Ok(true) => continue,
            Ok(false) => tokio::time::sleep(Duration::from_secs(2)).await,
            Err(err) => {
                error!(worker = name, %err, "worker step failed");
                tokio::time::sleep(Duration::from_secs(2)).await;
            }
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
