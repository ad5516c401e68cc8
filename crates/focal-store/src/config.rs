//! Workspace configuration stored in `.focal/config.json`.
//!
//! The file is a flat JSON object. Unknown keys are kept on disk and
//! ignored by the typed view.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Typed view over `config.json`. Every field has a default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FocalConfig {
    /// Freshness window of the analytics cache, in seconds.
    pub cache_ttl_secs: u64,
    /// Adopt `analytics_cache.json` at startup when it still matches the log.
    pub warm_start: bool,
    /// `sync_all` after every append.
    pub fsync: bool,
    pub bind: String,
    pub port: u16,
    /// Directory served for unmatched GET paths.
    pub static_dir: Option<PathBuf>,
    /// Fallback filter when `RUST_LOG` is unset.
    pub log_level: String,
}

impl Default for FocalConfig {
    fn default() -> Self {
        Self {
            cache_ttl_secs: 5 * 60,
            warm_start: false,
            fsync: false,
            bind: "127.0.0.1".to_string(),
            port: 3000,
            static_dir: None,
            log_level: "info".to_string(),
        }
    }
}

impl FocalConfig {
    /// Load from `config.json`; a missing file gives the defaults.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        Self::from_map(read_config(path)?)
    }

    pub fn from_map(map: Map<String, Value>) -> anyhow::Result<Self> {
        serde_json::from_value(Value::Object(map))
            .map_err(|e| anyhow::anyhow!("invalid config.json: {e}"))
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

/// Read config from `config.json`. Returns empty map if file doesn't exist.
pub fn read_config(path: &Path) -> anyhow::Result<Map<String, Value>> {
    if !path.exists() {
        return Ok(Map::new());
    }
    let content = std::fs::read_to_string(path)?;
    let val: Value = serde_json::from_str(&content)?;
    match val {
        Value::Object(map) => Ok(map),
        _ => Ok(Map::new()),
    }
}

/// Write config to `config.json`.
pub fn write_config(path: &Path, config: &Map<String, Value>) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(&config)?;
    crate::write_atomic(path, json.as_bytes())
}

/// Parse a string value into an appropriate JSON value (bool/number/string).
pub fn parse_value(s: &str) -> Value {
    match s {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        _ => {
            if let Ok(n) = s.parse::<i64>() {
                Value::Number(n.into())
            } else if let Ok(f) = s.parse::<f64>() {
                serde_json::json!(f)
            } else {
                Value::String(s.to_string())
            }
        }
    }
}

/// Set one key, refusing values that would make the typed view unloadable.
pub fn set_value(path: &Path, key: &str, raw: &str) -> anyhow::Result<Value> {
    let mut map = read_config(path)?;
    let value = parse_value(raw);
    map.insert(key.to_string(), value.clone());
    FocalConfig::from_map(map.clone())?;
    write_config(path, &map)?;
    Ok(value)
}
