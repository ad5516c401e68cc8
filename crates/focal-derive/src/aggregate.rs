use chrono::Datelike;
use focal_core::SessionRecord;

use crate::productivity::calculate_productivity;
use crate::streak::{calculate_streaks, parse_session_date};
use crate::types::{AnalyticsSnapshot, PeriodStats};

fn add_to(bucket: &mut PeriodStats, session: &SessionRecord) {
    bucket.sessions += 1;
    bucket.distractions = bucket.distractions.saturating_add(session.distraction_count);
    bucket.focus_time += session.actual_duration;
    if session.was_completed {
        bucket.completed_sessions += 1;
    }
}

/// ISO week key such as `2024-W01`.
fn week_key(date: &str) -> Option<String> {
    let week = parse_session_date(date)?.iso_week();
    Some(format!("{}-W{:02}", week.year(), week.week()))
}

/// Normalized distraction label. A blank label normalizes to `""` and still counts.
fn distraction_key(label: &str) -> String {
    label.trim().to_lowercase()
}

/// Build the full analytics snapshot from sessions in log order.
pub fn aggregate(sessions: &[SessionRecord]) -> AnalyticsSnapshot {
    let mut snap = AnalyticsSnapshot {
        total_sessions: sessions.len() as u64,
        last_session_timestamp: sessions.last().map(|s| s.timestamp.clone()),
        ..AnalyticsSnapshot::default()
    };

    let mut total_distractions = 0u64;
    for session in sessions {
        *snap
            .sessions_by_type
            .entry(session.session_type.clone())
            .or_default() += 1;

        // Daily buckets key on the stored date string as-is.
        add_to(
            snap.daily_stats.entry(session.date.clone()).or_default(),
            session,
        );
        if let Some(week) = week_key(&session.date) {
            add_to(snap.weekly_stats.entry(week).or_default(), session);
        }

        snap.total_focus_time += session.actual_duration;
        total_distractions = total_distractions.saturating_add(session.distraction_count);

        for d in &session.distractions {
            *snap
                .top_distractions
                .entry(distraction_key(&d.label))
                .or_default() += 1;
        }
    }

    if !sessions.is_empty() {
        snap.average_distractions = total_distractions as f64 / sessions.len() as f64;
    }
    snap.focus_streaks = calculate_streaks(sessions.iter().map(|s| s.date.as_str()));
    snap.productivity = calculate_productivity(sessions);
    snap
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{completed, distracted, session};
    use crate::types::{Productivity, Streaks};

    #[test]
    fn empty_log_is_all_zero() {
        let snap = aggregate(&[]);
        assert_eq!(snap.total_sessions, 0);
        assert_eq!(snap.average_distractions, 0.0);
        assert_eq!(snap.total_focus_time, 0.0);
        assert!(snap.last_session_timestamp.is_none());
        assert_eq!(snap.focus_streaks, Streaks { current: 0, max: 0 });
        assert_eq!(snap.productivity, Productivity::default());
        assert!(snap.daily_stats.is_empty());
        assert!(snap.error.is_none());
    }

    #[test]
    fn counts_types_days_and_totals() {
        let sessions = vec![
            completed(distracted(
                session("a", "2024-01-01", "deep work", 45.0),
                &["Phone", "email"],
            )),
            session("b", "2024-01-01", "reading", 20.0),
            distracted(session("c", "2024-01-02", "deep work", 30.0), &["  PHONE "]),
        ];
        let snap = aggregate(&sessions);

        assert_eq!(snap.total_sessions, 3);
        assert_eq!(snap.sessions_by_type["deep work"], 2);
        assert_eq!(snap.sessions_by_type["reading"], 1);
        assert_eq!(snap.total_focus_time, 95.0);
        assert_eq!(snap.average_distractions, 1.0);

        let day1 = &snap.daily_stats["2024-01-01"];
        assert_eq!(day1.sessions, 2);
        assert_eq!(day1.distractions, 2);
        assert_eq!(day1.focus_time, 65.0);
        assert_eq!(day1.completed_sessions, 1);

        assert_eq!(snap.top_distractions["phone"], 2);
        assert_eq!(snap.top_distractions["email"], 1);
        assert_eq!(snap.focus_streaks, Streaks { current: 2, max: 2 });
    }

    #[test]
    fn last_session_is_last_appended_not_latest() {
        let sessions = vec![
            session("a", "2024-05-01", "focus", 1.0),
            session("b", "2024-01-01", "focus", 1.0),
        ];
        let snap = aggregate(&sessions);
        assert_eq!(
            snap.last_session_timestamp.as_deref(),
            Some("2024-01-01T09:00:00.000Z")
        );
    }

    #[test]
    fn weekly_rollup_uses_iso_weeks() {
        let sessions = vec![
            session("a", "2024-01-01", "focus", 10.0), // Monday, 2024-W01
            session("b", "2024-01-07", "focus", 20.0), // Sunday, 2024-W01
            session("c", "2024-01-08", "focus", 5.0),  // 2024-W02
            session("d", "2023-01-01", "focus", 1.0),  // Sunday, 2022-W52
            session("e", "garbled", "focus", 1.0),
        ];
        let snap = aggregate(&sessions);
        assert_eq!(snap.weekly_stats["2024-W01"].sessions, 2);
        assert_eq!(snap.weekly_stats["2024-W01"].focus_time, 30.0);
        assert_eq!(snap.weekly_stats["2024-W02"].sessions, 1);
        assert_eq!(snap.weekly_stats["2022-W52"].sessions, 1);
        assert_eq!(snap.weekly_stats.len(), 3);
        // Unparseable dates still count in the daily rollup.
        assert_eq!(snap.daily_stats["garbled"].sessions, 1);
    }

    #[test]
    fn blank_distraction_labels_count_under_empty_key() {
        let sessions = vec![distracted(
            session("a", "2024-01-01", "focus", 1.0),
            &["", "   ", "Noise"],
        )];
        let snap = aggregate(&sessions);
        assert_eq!(snap.top_distractions.len(), 2);
        assert_eq!(snap.top_distractions[""], 2);
        assert_eq!(snap.top_distractions["noise"], 1);
    }

    #[test]
    fn huge_distraction_counts_saturate() {
        let mut a = session("a", "2024-01-01", "focus", 1.0);
        let mut b = session("b", "2024-01-01", "focus", 1.0);
        a.distraction_count = u64::MAX;
        b.distraction_count = u64::MAX;
        let snap = aggregate(&[a, b]);
        assert_eq!(snap.daily_stats["2024-01-01"].distractions, u64::MAX);
        assert_eq!(snap.average_distractions, u64::MAX as f64 / 2.0);
    }

    #[test]
    fn aggregation_is_idempotent() {
        let sessions = vec![
            completed(distracted(session("a", "2024-01-01", "x", 12.5), &["a", "b"])),
            session("b", "2024-01-03", "y", 7.25),
        ];
        let first = aggregate(&sessions);
        let second = aggregate(&sessions);
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn snapshot_serializes_with_camel_case_keys() {
        let snap = aggregate(&[completed(session("a", "2024-01-01", "focus", 45.0))]);
        let v = serde_json::to_value(&snap).unwrap();
        assert_eq!(v["totalSessions"], 1);
        assert_eq!(v["dailyStats"]["2024-01-01"]["completedSessions"], 1);
        assert_eq!(v["focusStreaks"]["current"], 1);
        assert_eq!(v["productivity"]["completionRate"], 100);
        assert_eq!(v["lastSessionTimestamp"], "2024-01-01T09:00:00.000Z");
        assert!(v.get("error").is_none());
    }
}
