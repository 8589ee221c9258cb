//! Lifecycle Manager (C8): tier transitions between `hot`/`cold`/`archived`
//! and the resurrection rules that bring a skill back to `hot`.
//!
//! Runs as its own job alongside the ranking engine rather than as a step
//! inside it, so tier changes are visible to Phase B's archived-skip rule
//! without an ordering dependency between the two jobs.

use chrono::{DateTime, Utc};
use skillreg_types::error::LifecycleError;
use skillreg_types::skill::Tier;

use crate::repository::skill::SkillRepository;
use crate::source_host::SourceHostClient;

/// No activity for a quarter drops a skill from `hot` to `cold`.
pub const COLD_AFTER_DAYS: i64 = 90;
/// No activity for a year, with the host still reachable, is long-dormant
/// enough to archive outright.
pub const ARCHIVE_AFTER_DAYS: i64 = 365;
/// Resurrection-on-access star threshold.
pub const RESURRECT_STARS_THRESHOLD: i64 = 20;
/// Resurrection-on-access activity window.
pub const RESURRECT_ACTIVITY_DAYS: i64 = 90;

fn days_since(ts: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Option<i64> {
    ts.map(|t| (now - t).num_days())
}

/// Pure hot/cold/archived decision for a skill whose host repo is still
/// reachable, based on its most recent push. Skills with no push
/// timestamp at all are left on their current tier rather than guessed at.
pub fn next_tier_from_activity(current: Tier, last_commit_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Tier {
    match days_since(last_commit_at, now) {
        Some(d) if d < COLD_AFTER_DAYS => Tier::Hot,
        Some(d) if d < ARCHIVE_AFTER_DAYS => Tier::Cold,
        Some(_) => Tier::Archived,
        None => current,
    }
}

/// Whether a download/view of a `cold`/`archived` skill should resurrect
/// it to `hot` (the host-repo-came-back-to-life case is handled in
/// [`run_lifecycle_sweep`]; this covers the user-triggered freshness
/// check).
pub fn should_resurrect_on_access(stars: i64, last_commit_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
    stars >= RESURRECT_STARS_THRESHOLD
        || days_since(last_commit_at, now).is_some_and(|d| d < RESURRECT_ACTIVITY_DAYS)
}

fn store_err(e: skillreg_types::error::ApiError) -> LifecycleError {
    LifecycleError::Store(e.to_string())
}

/// One full lifecycle pass: decays hot/cold skills by activity, archives
/// any whose host repo has disappeared, and resurrects archived skills
/// whose host repo answers again.
pub async fn run_lifecycle_sweep<S, H>(store: &S, host: &H, now: DateTime<Utc>) -> Result<(), LifecycleError>
where
    S: SkillRepository,
    H: SourceHostClient,
{
    for id in store.list_active_ids().await.map_err(store_err)? {
        let Some(skill) = store.find_skill_by_id(id).await.map_err(store_err)? else {
            continue;
        };

        let repo = host.get_repo(&skill.repo_owner, &skill.repo_name).await?;
        let Some(repo) = repo else {
            store
                .mark_archived_by_coordinate(&skill.repo_owner, &skill.repo_name)
                .await
                .map_err(store_err)?;
            continue;
        };

        let new_tier = next_tier_from_activity(skill.tier, repo.pushed_at, now);
        if new_tier != skill.tier {
            store.set_tier(skill.id, new_tier, now).await.map_err(store_err)?;
        }
    }

    for id in store.list_archived_ids().await.map_err(store_err)? {
        let Some(skill) = store.find_skill_by_id(id).await.map_err(store_err)? else {
            continue;
        };
        if host.get_repo(&skill.repo_owner, &skill.repo_name).await?.is_some() {
            store.set_tier(skill.id, Tier::Hot, now).await.map_err(store_err)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn days_ago(now: DateTime<Utc>, days: i64) -> DateTime<Utc> {
        now - Duration::days(days)
    }

    #[test]
    fn recent_activity_stays_or_returns_to_hot() {
        let now = Utc::now();
        assert_eq!(next_tier_from_activity(Tier::Cold, Some(days_ago(now, 5)), now), Tier::Hot);
    }

    #[test]
    fn no_activity_for_a_quarter_goes_cold() {
        let now = Utc::now();
        assert_eq!(next_tier_from_activity(Tier::Hot, Some(days_ago(now, 120)), now), Tier::Cold);
    }

    #[test]
    fn long_dormant_goes_archived_even_if_host_reachable() {
        let now = Utc::now();
        assert_eq!(next_tier_from_activity(Tier::Cold, Some(days_ago(now, 400)), now), Tier::Archived);
    }

    #[test]
    fn missing_push_timestamp_leaves_tier_unchanged() {
        let now = Utc::now();
        assert_eq!(next_tier_from_activity(Tier::Cold, None, now), Tier::Cold);
    }

    #[test]
    fn resurrects_on_high_star_count_regardless_of_activity() {
        let now = Utc::now();
        assert!(should_resurrect_on_access(25, Some(days_ago(now, 400)), now));
    }

    #[test]
    fn resurrects_on_recent_activity_regardless_of_stars() {
        let now = Utc::now();
        assert!(should_resurrect_on_access(1, Some(days_ago(now, 10)), now));
    }

    #[test]
    fn does_not_resurrect_when_neither_condition_holds() {
        let now = Utc::now();
        assert!(!should_resurrect_on_access(5, Some(days_ago(now, 400)), now));
        assert!(!should_resurrect_on_access(5, None, now));
    }
}
