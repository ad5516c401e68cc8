use focal_core::{ClientInfo, Distraction};
use focal_derive::Tracker;
use focal_ledger::WorkspaceLock;
use std::path::Path;

pub struct LogParams<'a> {
    pub repo_root: &'a Path,
    pub session_type: &'a str,
    pub actual: f64,
    pub planned: Option<f64>,
    pub distractions: &'a [String],
    pub completed: bool,
}

/// Build the same payload a client would POST to `/api/log-session`.
fn build_payload(params: &LogParams<'_>) -> anyhow::Result<serde_json::Value> {
    let now = chrono::Local::now().format("%H:%M:%S").to_string();
    let distractions: Vec<Distraction> = params
        .distractions
        .iter()
        .map(|label| Distraction {
            label: label.clone(),
            occurred_at: Some(now.clone()),
        })
        .collect();

    let mut payload = serde_json::json!({
        "sessionType": params.session_type,
        "actualDuration": params.actual,
        "distractionCount": distractions.len(),
        "distractions": serde_json::to_value(&distractions)?,
        "wasCompleted": params.completed,
    });
    if let Some(planned) = params.planned {
        payload["plannedDuration"] = serde_json::json!(planned);
    }
    if params.completed {
        payload["completedAt"] = serde_json::json!(chrono::Utc::now()
            .to_rfc3339_opts(chrono::SecondsFormat::Millis, true));
    }
    Ok(payload)
}

pub fn execute(params: &LogParams<'_>) -> anyhow::Result<()> {
    let (paths, config) = crate::open_workspace(params.repo_root)?;
    let _lock = WorkspaceLock::acquire(&paths)?;
    let tracker = Tracker::open(&paths, &config)?;

    let client = ClientInfo {
        ip: None,
        user_agent: Some(format!("focal-cli/{}", env!("CARGO_PKG_VERSION"))),
    };
    let receipt = tracker.submit_session(&build_payload(params)?, client)?;
    println!("{}", receipt.id);
    Ok(())
}
