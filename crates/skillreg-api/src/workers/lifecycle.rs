//! Lifecycle Manager (C8) entry point for the scheduled job and the
//! `lifecycle-once` CLI command. The tier-transition rules live in
//! [`skillreg_core::lifecycle::run_lifecycle_sweep`].

use chrono::Utc;
use skillreg_types::error::LifecycleError;

use crate::state::AppState;

pub async fn run_once(state: &AppState) -> Result<(), LifecycleError> {
    skillreg_core::lifecycle::run_lifecycle_sweep(&*state.skills, &*state.host, Utc::now()).await
}
