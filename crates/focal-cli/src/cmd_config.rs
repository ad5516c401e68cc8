use clap::Subcommand;
use focal_store::config::{read_config, set_value};
use focal_store::FocalConfig;
use std::path::Path;

// ── CLI Schema ──

#[derive(Subcommand)]
pub enum ConfigCmd {
    /// Set a config value
    Set {
        /// Config key (e.g. cache_ttl_secs)
        key: String,
        /// Config value (true/false/number/string)
        value: String,
    },
    /// Get a config value
    Get {
        /// Config key
        key: String,
    },
    /// List all config values, defaults included
    List,
}

// ── Dispatch ──

pub fn run(cmd: ConfigCmd, repo_root: &Path) -> anyhow::Result<()> {
    match cmd {
        ConfigCmd::Set { key, value } => set(repo_root, &key, &value),
        ConfigCmd::Get { key } => get(repo_root, &key),
        ConfigCmd::List => list(repo_root),
    }
}

// ── Command Implementations ──

/// Stored values layered over the typed defaults.
fn effective(path: &Path) -> anyhow::Result<serde_json::Map<String, serde_json::Value>> {
    let stored = read_config(path)?;
    let typed = FocalConfig::from_map(stored.clone())?;
    let mut merged = match serde_json::to_value(typed)? {
        serde_json::Value::Object(map) => map,
        _ => serde_json::Map::new(),
    };
    merged.extend(stored);
    Ok(merged)
}

/// `focal config set <key> <value>`
pub fn set(repo_root: &Path, key: &str, value: &str) -> anyhow::Result<()> {
    let (paths, _) = crate::open_workspace(repo_root)?;
    let parsed = set_value(&paths.config_json, key, value)?;
    println!("{key} = {parsed}");
    Ok(())
}

/// `focal config get <key>`
pub fn get(repo_root: &Path, key: &str) -> anyhow::Result<()> {
    let (paths, _) = crate::open_workspace(repo_root)?;
    match effective(&paths.config_json)?.get(key) {
        Some(val) => println!("{val}"),
        None => anyhow::bail!("config key not found: {key}"),
    }
    Ok(())
}

/// `focal config list`
pub fn list(repo_root: &Path) -> anyhow::Result<()> {
    let (paths, _) = crate::open_workspace(repo_root)?;
    for (key, val) in effective(&paths.config_json)? {
        println!("{key} = {val}");
    }
    Ok(())
}
