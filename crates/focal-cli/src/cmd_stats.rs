use focal_derive::{AnalyticsSnapshot, Tracker};
use std::path::Path;

pub fn execute(repo_root: &Path, json: bool) -> anyhow::Result<()> {
    let (paths, config) = crate::open_workspace(repo_root)?;
    let tracker = Tracker::open(&paths, &config)?;
    let snap = tracker.analytics();

    if json {
        println!("{}", serde_json::to_string_pretty(&*snap)?);
    } else {
        print!("{}", render(&snap));
    }
    Ok(())
}

fn render(snap: &AnalyticsSnapshot) -> String {
    let mut out = String::new();
    if let Some(err) = &snap.error {
        out.push_str(&format!("warning: {err}\n"));
    }
    out.push_str(&format!("Sessions:         {}\n", snap.total_sessions));
    out.push_str(&format!("Focus time:       {:.1} min\n", snap.total_focus_time));
    out.push_str(&format!(
        "Avg distractions: {:.2}\n",
        snap.average_distractions
    ));
    out.push_str(&format!(
        "Streak:           {} day(s) (best {})\n",
        snap.focus_streaks.current, snap.focus_streaks.max
    ));
    out.push_str(&format!(
        "Completion rate:  {}% over recent sessions, avg {:.1} min\n",
        snap.productivity.completion_rate, snap.productivity.average_session_length
    ));
    if let Some(last) = &snap.last_session_timestamp {
        out.push_str(&format!("Last session:     {last}\n"));
    }

    if !snap.sessions_by_type.is_empty() {
        out.push_str("\nBy type:\n");
        for (ty, n) in &snap.sessions_by_type {
            out.push_str(&format!("  {ty:<20} {n}\n"));
        }
    }

    if !snap.top_distractions.is_empty() {
        let mut top: Vec<_> = snap.top_distractions.iter().collect();
        top.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
        out.push_str("\nTop distractions:\n");
        for (label, n) in top.into_iter().take(5) {
            out.push_str(&format!("  {label:<20} {n}\n"));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_empty_snapshot() {
        let text = render(&AnalyticsSnapshot::default());
        assert!(text.contains("Sessions:         0"));
        assert!(!text.contains("By type"));
        assert!(!text.contains("Last session"));
    }

    #[test]
    fn render_orders_distractions_by_count() {
        let mut snap = AnalyticsSnapshot::default();
        snap.total_sessions = 3;
        snap.sessions_by_type.insert("focus".into(), 3);
        snap.top_distractions.insert("email".into(), 1);
        snap.top_distractions.insert("phone".into(), 4);
        let text = render(&snap);
        let phone = text.find("phone").unwrap();
        let email = text.find("email").unwrap();
        assert!(phone < email);
        assert!(text.contains("focus"));
    }

    #[test]
    fn render_shows_degraded_marker() {
        let text = render(&AnalyticsSnapshot::failed("Failed to load analytics"));
        assert!(text.starts_with("warning: Failed to load analytics"));
    }
}
