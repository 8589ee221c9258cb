//! Ranking Engine (C7) entry point for the scheduled job and the
//! `rank-once` CLI command. The two-phase algorithm itself lives in
//! [`skillreg_core::ranking::run_ranking`]; this just supplies the
//! concrete adapters and the current time.

use chrono::Utc;
use skillreg_types::error::RankingError;

use crate::state::AppState;

pub async fn run_once(state: &AppState) -> Result<(), RankingError> {
    skillreg_core::ranking::run_ranking(
        &*state.skills,
        &*state.authors,
        &*state.host,
        &*state.kv,
        &*state.objects,
        Utc::now(),
    )
    .await
}
