//! Command-line surface for `skregd`: one binary that either serves the
//! registry read API or runs a single worker pass, for cron/systemd-timer
//! style invocation (§5 "scheduled tasks").

pub mod status;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "skregd", version, about = "Skill registry server and workers", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Emit machine-readable JSON instead of plain text for one-shot commands.
    #[arg(long, global = true)]
    pub json: bool,

    /// Raise the default log level to `debug` when `RUST_LOG` is unset.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the registry read API and the background worker schedule.
    Serve {
        #[arg(long, default_value_t = 8080)]
        port: u16,
        #[arg(long, default_value = "0.0.0.0")]
        host: String,
    },
    /// Run one poller cycle (C4): enumerate new push events, enqueue indexing jobs.
    PollOnce,
    /// Drain the indexing queue once (C5).
    Reindex,
    /// Drain the classification queue once (C6).
    ClassifyOnce,
    /// Run one ranking pass (C7): marked updates, full recompute, cache regeneration.
    RankOnce,
    /// Run one lifecycle sweep (C8): tier transitions and resurrection checks.
    LifecycleOnce,
    /// Print queue depths and the last poller/ranking run times.
    Status,
    /// Generate shell completion scripts.
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}
