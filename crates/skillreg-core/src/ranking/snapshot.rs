//! Star-snapshot compression (§4.7 "Snapshot compression").

use chrono::{DateTime, Datelike, Duration, Utc, Weekday};
use skillreg_types::skill::StarSnapshot;

/// Compresses a skill's snapshot history to at most 20 points, keeping
/// the union of: first, last, anything in the last 7 days, anything in
/// the last 8 weeks that falls on a Sunday, anything older that is the
/// first of its month, and anything whose delta vs. the previously kept
/// point exceeds 10%. If the union still exceeds 20, keeps the most
/// recent 20.
pub fn compress_snapshots(snapshots: &[StarSnapshot], now: DateTime<Utc>) -> Vec<StarSnapshot> {
    let mut sorted = snapshots.to_vec();
    sorted.sort_by_key(|s| s.d);
    let n = sorted.len();
    if n == 0 {
        return sorted;
    }

    let mut keep = vec![false; n];
    keep[0] = true;
    keep[n - 1] = true;

    let last_7d = (now - Duration::days(7)).date_naive();
    let last_8w = (now - Duration::weeks(8)).date_naive();

    for (i, sn) in sorted.iter().enumerate() {
        if sn.d >= last_7d {
            keep[i] = true;
        } else if sn.d >= last_8w {
            if sn.d.weekday() == Weekday::Sun {
                keep[i] = true;
            }
        } else if sn.d.day() == 1 {
            keep[i] = true;
        }
    }

    let mut prev_idx: Option<usize> = None;
    for i in 0..n {
        if keep[i] {
            prev_idx = Some(i);
            continue;
        }
        if let Some(p) = prev_idx {
            let prev_s = sorted[p].s as f64;
            let delta_pct = if prev_s == 0.0 {
                if sorted[i].s != 0 { 1.0 } else { 0.0 }
            } else {
                (sorted[i].s as f64 - prev_s).abs() / prev_s
            };
            if delta_pct > 0.10 {
                keep[i] = true;
                prev_idx = Some(i);
            }
        }
    }

    let mut result: Vec<StarSnapshot> = sorted
        .into_iter()
        .enumerate()
        .filter(|(i, _)| keep[*i])
        .map(|(_, s)| s)
        .collect();

    if result.len() > 20 {
        let start = result.len() - 20;
        result = result.split_off(start);
    }
    result
}

/// Appends today's observation (if stars changed) and re-compresses.
pub fn append_and_compress(
    existing: &[StarSnapshot],
    today: chrono::NaiveDate,
    stars: i64,
    now: DateTime<Utc>,
) -> Vec<StarSnapshot> {
    let already_has_today = existing.last().is_some_and(|sn| sn.d == today);
    let changed = existing.last().is_none_or(|sn| sn.s != stars);
    if !changed && already_has_today {
        return existing.to_vec();
    }
    let mut next = existing.to_vec();
    if already_has_today {
        next.last_mut().unwrap().s = stars;
    } else {
        next.push(StarSnapshot { d: today, s: stars });
    }
    compress_snapshots(&next, now)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snap(days_ago: i64, s: i64, now: DateTime<Utc>) -> StarSnapshot {
        StarSnapshot {
            d: (now - Duration::days(days_ago)).date_naive(),
            s,
        }
    }

    #[test]
    fn bounded_at_twenty() {
        let now = Utc::now();
        let many: Vec<StarSnapshot> = (0..100).map(|i| snap(i, 100 + i, now)).collect();
        let compressed = compress_snapshots(&many, now);
        assert!(compressed.len() <= 20);
    }

    #[test]
    fn strictly_ascending_by_date() {
        let now = Utc::now();
        let many: Vec<StarSnapshot> = (0..50).map(|i| snap(i, 100 + i, now)).collect();
        let compressed = compress_snapshots(&many, now);
        for w in compressed.windows(2) {
            assert!(w[0].d < w[1].d);
        }
    }

    #[test]
    fn keeps_first_and_last() {
        let now = Utc::now();
        let series = vec![snap(400, 1, now), snap(200, 2, now), snap(0, 3, now)];
        let compressed = compress_snapshots(&series, now);
        assert_eq!(compressed.first().unwrap().s, 1);
        assert_eq!(compressed.last().unwrap().s, 3);
    }

    #[test]
    fn large_delta_point_is_retained() {
        let now = Utc::now();
        let mut series: Vec<StarSnapshot> = (60..90).map(|i| snap(i, 100, now)).collect();
        series.push(snap(55, 500, now));
        let compressed = compress_snapshots(&series, now);
        assert!(compressed.iter().any(|s| s.s == 500));
    }

    #[test]
    fn append_is_idempotent_when_unchanged() {
        let now = Utc::now();
        let existing = vec![snap(0, 10, now)];
        let today = now.date_naive();
        let result = append_and_compress(&existing, today, 10, now);
        assert_eq!(result, existing);
    }
}
