use focal_core::SessionRecord;

use crate::types::Productivity;

/// Number of most recent sessions the productivity metrics look at.
pub const RECENT_WINDOW: usize = 10;

/// Completion rate and mean length over the last `RECENT_WINDOW` sessions in log order.
pub fn calculate_productivity(sessions: &[SessionRecord]) -> Productivity {
    let recent = &sessions[sessions.len().saturating_sub(RECENT_WINDOW)..];
    if recent.is_empty() {
        return Productivity::default();
    }
    let n = recent.len() as f64;
    let completed = recent.iter().filter(|s| s.was_completed).count() as f64;
    let minutes: f64 = recent.iter().map(|s| s.actual_duration).sum();

    Productivity {
        completion_rate: (completed / n * 100.0).round() as u32,
        average_session_length: minutes / n,
    }
}
