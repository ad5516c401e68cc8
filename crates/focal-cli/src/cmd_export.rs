use focal_derive::Tracker;
use std::path::Path;

pub fn execute(repo_root: &Path, output: Option<&Path>) -> anyhow::Result<()> {
    let (paths, config) = crate::open_workspace(repo_root)?;
    let tracker = Tracker::open(&paths, &config)?;
    let records = tracker.export_all()?;
    let json = serde_json::to_string_pretty(&records)?;

    match output {
        Some(path) => {
            focal_store::write_atomic(path, json.as_bytes())?;
            eprintln!("Exported {} session(s) to {}", records.len(), path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}
