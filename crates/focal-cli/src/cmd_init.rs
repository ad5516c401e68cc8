use focal_ledger::FocalPaths;
use focal_store::config::{read_config, write_config};
use std::path::Path;

pub fn execute(repo_root: &Path) -> anyhow::Result<()> {
    let paths = FocalPaths::discover(repo_root);
    let existed = paths.is_initialized();
    paths.ensure_layout()?;

    if !paths.sessions_jsonl.exists() {
        std::fs::write(&paths.sessions_jsonl, b"")?;
    }
    if !paths.config_json.exists() {
        let defaults = serde_json::to_value(focal_store::FocalConfig::default())?;
        if let serde_json::Value::Object(map) = defaults {
            write_config(&paths.config_json, &map)?;
        }
    } else {
        // Fail early on a hand-edited config that no longer parses.
        focal_store::FocalConfig::from_map(read_config(&paths.config_json)?)?;
    }

    if existed {
        println!("Already initialized at {}", paths.focal_dir.display());
    } else {
        println!("Initialized .focal/ at {}", paths.focal_dir.display());
    }
    Ok(())
}
