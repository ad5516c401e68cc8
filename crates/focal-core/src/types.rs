use serde::{Deserialize, Serialize};

/// Prefix for generated session IDs: `ses_<ulid>`.
pub const SESSION_ID_PREFIX: &str = "ses_";

/// One distraction noted during a session.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Distraction {
    #[serde(rename = "distraction", default)]
    pub label: String,
    #[serde(
        rename = "time",
        alias = "occurredAt",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub occurred_at: Option<String>,
}

/// A single focus session (one JSONL line in sessions.jsonl).
///
/// Never mutated once appended.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    pub id: String,
    /// Write-time instant, RFC 3339 UTC.
    pub timestamp: String,
    /// Local calendar date of `timestamp` (`YYYY-MM-DD`).
    pub date: String,
    pub session_type: String,
    #[serde(default)]
    pub planned_duration: f64,
    pub actual_duration: f64,
    #[serde(default)]
    pub distraction_count: u64,
    #[serde(default)]
    pub distractions: Vec<Distraction>,
    #[serde(default)]
    pub was_completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<String>,
    #[serde(rename = "userIP", default, skip_serializing_if = "Option::is_none")]
    pub user_ip: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
}

/// Where a write came from. Informational only.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientInfo {
    pub ip: Option<String>,
    pub user_agent: Option<String>,
}
