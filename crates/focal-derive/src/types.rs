use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Rollup for one calendar day or ISO week.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodStats {
    pub sessions: u64,
    pub distractions: u64,
    pub focus_time: f64,
    pub completed_sessions: u64,
}

/// Consecutive-day streaks over the full session history.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Streaks {
    pub current: u32,
    pub max: u32,
}

/// Rolling metrics over the most recent sessions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Productivity {
    /// Percentage, 0-100.
    pub completion_rate: u32,
    pub average_session_length: f64,
}

/// Every statistic derived from the session log.
///
/// A pure function of the log contents; maps are ordered so two
/// computations over the same log serialize identically.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AnalyticsSnapshot {
    pub total_sessions: u64,
    pub sessions_by_type: BTreeMap<String, u64>,
    pub average_distractions: f64,
    pub daily_stats: BTreeMap<String, PeriodStats>,
    pub weekly_stats: BTreeMap<String, PeriodStats>,
    pub total_focus_time: f64,
    #[serde(alias = "lastSession")]
    pub last_session_timestamp: Option<String>,
    pub top_distractions: BTreeMap<String, u64>,
    pub focus_streaks: Streaks,
    pub productivity: Productivity,
    /// Set only on the degraded read path.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AnalyticsSnapshot {
    /// Zeroed snapshot carrying an error marker.
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            ..Self::default()
        }
    }
}
