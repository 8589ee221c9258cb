//! Classification Worker (C6, §4.6). Re-reads a skill's content from the
//! object store and re-derives its category set via the keyword pass (no
//! AI suggester is wired in -- see [`skillreg_core::classify::NoopSuggester`]).

use std::time::Duration;

use skillreg_core::classify::{classify, NoopSuggester};
use skillreg_core::queue::{backoff_delay, Queue};
use skillreg_core::repository::category::CategoryRepository;
use skillreg_core::repository::object_store::ObjectStore;
use skillreg_core::repository::skill::SkillRepository;
use skillreg_types::error::ApiError;
use tracing::warn;

use crate::state::AppState;

const MAX_ATTEMPTS: u32 = 5;

/// Pulls one job off the classification queue and processes it, returning
/// `false` if the queue was empty.
pub async fn process_one(state: &AppState) -> Result<bool, ApiError> {
    let Some(delivery) = state.classify_queue.dequeue().await.map_err(|e| ApiError::Transient(e.to_string()))? else {
        return Ok(false);
    };

    match classify_skill(state, delivery.job.skill_id).await {
        Ok(()) => {
            state.classify_queue.ack(delivery.attempt).await.map_err(|e| ApiError::Transient(e.to_string()))?;
        }
        Err(err) => {
            warn!(skill_id = %delivery.job.skill_id, error = %err, "classification job failed");
            let delay = backoff_delay(delivery.attempt, Duration::from_secs(1), Duration::from_secs(60));
            state
                .classify_queue
                .nack(delivery.attempt, delay, MAX_ATTEMPTS)
                .await
                .map_err(|e| ApiError::Transient(e.to_string()))?;
        }
    }
    Ok(true)
}

async fn classify_skill(state: &AppState, skill_id: uuid::Uuid) -> Result<(), ApiError> {
    let Some(skill) = state.skills.find_skill_by_id(skill_id).await? else {
        return Ok(());
    };

    let object_key = if skill.skill_path.is_empty() {
        format!("skills/{}/{}/SKILL.md", skill.repo_owner, skill.repo_name)
    } else {
        format!("skills/{}/{}/{}/SKILL.md", skill.repo_owner, skill.repo_name, skill.skill_path)
    };
    let content = state
        .objects
        .get(&object_key)
        .await?
        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
        .unwrap_or_default();

    let predefined = state.categories.predefined().to_vec();
    let result = classify::<NoopSuggester>(skill_id, &skill.name, &skill.description, &content, &predefined, None).await;

    for category in &result.new_ai_suggested {
        state.categories.insert_ai_suggested_if_absent(category).await?;
    }
    state.skills.replace_skill_categories(skill_id, &result.categories).await?;
    Ok(())
}
