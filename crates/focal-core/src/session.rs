//! Write admission: turn a client payload into a `SessionRecord`.

use chrono::{DateTime, Local, SecondsFormat, Utc};
use serde_json::{Map, Value};

use crate::error::ValidationError;
use crate::types::{ClientInfo, Distraction, SessionRecord, SESSION_ID_PREFIX};

/// Largest accepted `distractionCount`.
pub const MAX_DISTRACTION_COUNT: u64 = u32::MAX as u64;

fn new_session_id() -> String {
    format!(
        "{SESSION_ID_PREFIX}{}",
        ulid::Ulid::new().to_string().to_lowercase()
    )
}

/// Treat JSON `null` the same as an absent field.
fn field<'a>(obj: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    obj.get(key).filter(|v| !v.is_null())
}

fn non_negative(v: &Value) -> Option<f64> {
    v.as_f64().filter(|n| n.is_finite() && *n >= 0.0)
}

fn parse_distractions(v: &Value) -> Result<Vec<Distraction>, ValidationError> {
    const EXPECTED: &str = "an array of {distraction, time} objects";
    let invalid = || ValidationError::InvalidField {
        field: "distractions",
        expected: EXPECTED,
    };
    let items = v.as_array().ok_or_else(invalid)?;
    items
        .iter()
        .map(|item| {
            let obj = item.as_object().ok_or_else(invalid)?;
            let label = field(obj, "distraction")
                .and_then(Value::as_str)
                .ok_or_else(invalid)?;
            let occurred_at = match field(obj, "time").or_else(|| field(obj, "occurredAt")) {
                None => None,
                Some(t) => Some(t.as_str().ok_or_else(invalid)?.to_string()),
            };
            Ok(Distraction {
                label: label.to_string(),
                occurred_at,
            })
        })
        .collect()
}

/// Validate a submitted payload and stamp it with id, timestamp and date.
///
/// `sessionType` and a numeric `actualDuration` are required. Optional
/// fields default when absent or null and are rejected when present with
/// the wrong type.
pub fn admit(
    payload: &Value,
    client: ClientInfo,
    now: DateTime<Utc>,
) -> Result<SessionRecord, ValidationError> {
    let obj = payload.as_object().ok_or(ValidationError::NotAnObject)?;

    // Stored verbatim; only the blank check looks at the trimmed form.
    let session_type = field(obj, "sessionType")
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .ok_or(ValidationError::MissingSessionType)?;

    let actual_duration = field(obj, "actualDuration")
        .and_then(non_negative)
        .ok_or(ValidationError::InvalidActualDuration)?;

    let planned_duration = match field(obj, "plannedDuration") {
        None => 0.0,
        Some(v) => non_negative(v).ok_or(ValidationError::InvalidField {
            field: "plannedDuration",
            expected: "a non-negative number",
        })?,
    };

    let distraction_count = match field(obj, "distractionCount") {
        None => 0,
        Some(v) => v
            .as_u64()
            .filter(|n| *n <= MAX_DISTRACTION_COUNT)
            .ok_or(ValidationError::InvalidField {
                field: "distractionCount",
                expected: "an integer between 0 and 4294967295",
            })?,
    };

    let distractions = match field(obj, "distractions") {
        None => Vec::new(),
        Some(v) => parse_distractions(v)?,
    };

    let was_completed = match field(obj, "wasCompleted") {
        None => false,
        Some(v) => v.as_bool().ok_or(ValidationError::InvalidField {
            field: "wasCompleted",
            expected: "a boolean",
        })?,
    };

    let completed_at = match field(obj, "completedAt") {
        None => None,
        Some(v) => Some(
            v.as_str()
                .ok_or(ValidationError::InvalidField {
                    field: "completedAt",
                    expected: "a string",
                })?
                .to_string(),
        ),
    };

    Ok(SessionRecord {
        id: new_session_id(),
        timestamp: now.to_rfc3339_opts(SecondsFormat::Millis, true),
        date: now.with_timezone(&Local).format("%Y-%m-%d").to_string(),
        session_type: session_type.to_string(),
        planned_duration,
        actual_duration,
        distraction_count,
        distractions,
        was_completed,
        completed_at,
        user_ip: client.ip,
        user_agent: client.user_agent,
    })
}
