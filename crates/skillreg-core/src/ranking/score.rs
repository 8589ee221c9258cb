//! The trending-score formula (§4.7 "Score formula"), exact.

use chrono::{DateTime, Utc};
use skillreg_types::skill::StarSnapshot;

fn value_at_or_before(snapshots: &[StarSnapshot], target: chrono::NaiveDate, current_stars: i64) -> f64 {
    snapshots
        .iter()
        .filter(|sn| sn.d <= target)
        .max_by_key(|sn| sn.d)
        .map(|sn| sn.s as f64)
        .unwrap_or(current_stars as f64)
}

fn activity_factor(last_commit_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> f64 {
    let Some(last_commit_at) = last_commit_at else {
        return 1.0;
    };
    let days_since_commit = (now - last_commit_at).num_days();
    if days_since_commit <= 30 {
        1.0
    } else if days_since_commit <= 90 {
        0.9
    } else if days_since_commit <= 180 {
        0.7
    } else if days_since_commit <= 365 {
        0.5
    } else {
        0.3
    }
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// Computes `trendingScore` for a skill from cached snapshot data, exactly
/// as specified, without any source-host I/O.
pub fn compute_score(
    stars: i64,
    snapshots: &[StarSnapshot],
    indexed_at: DateTime<Utc>,
    last_commit_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> f64 {
    let base_score = ((stars as f64) + 1.0).log10() * 10.0;

    let date_7d = (now - chrono::Duration::days(7)).date_naive();
    let date_30d = (now - chrono::Duration::days(30)).date_naive();
    let stars_7d = value_at_or_before(snapshots, date_7d, stars);
    let stars_30d = value_at_or_before(snapshots, date_30d, stars);

    let daily7 = ((stars as f64 - stars_7d) / 7.0).max(0.0);
    let daily30 = ((stars as f64 - stars_30d) / 30.0).max(0.0);

    let acceleration = if daily30 > 0.1 {
        daily7 / daily30
    } else if daily7 > 0.0 {
        2.0
    } else {
        1.0
    };

    let velocity = (1.0 + (daily7 + 1.0).log2() * acceleration.min(3.0) * 0.4).clamp(1.0, 5.0);

    let days_since_indexed = (now - indexed_at).num_days() as f64;
    let recency = (1.5 - days_since_indexed / 14.0).max(1.0);

    let activity = activity_factor(last_commit_at, now);

    round2(base_score * velocity * recency * activity)
}
