use std::path::{Path, PathBuf};

/// All well-known paths under `.focal/`.
#[derive(Debug, Clone)]
pub struct FocalPaths {
    pub root: PathBuf,
    pub focal_dir: PathBuf,
    pub sessions_jsonl: PathBuf,
    pub analytics_cache_json: PathBuf,
    pub config_json: PathBuf,
    pub lock_file: PathBuf,
}

impl FocalPaths {
    /// Derive all paths from a workspace root. Pure computation, no I/O.
    pub fn discover(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let focal_dir = root.join(".focal");
        Self {
            sessions_jsonl: focal_dir.join("sessions.jsonl"),
            analytics_cache_json: focal_dir.join("analytics_cache.json"),
            config_json: focal_dir.join("config.json"),
            lock_file: focal_dir.join("LOCK"),
            focal_dir,
            root,
        }
    }

    /// Create the `.focal/` directory. Idempotent.
    pub fn ensure_layout(&self) -> anyhow::Result<()> {
        std::fs::create_dir_all(&self.focal_dir)?;
        Ok(())
    }

    /// Check whether `.focal/` exists.
    pub fn is_initialized(&self) -> bool {
        self.focal_dir.is_dir()
    }

    /// Walk up from `start` looking for a directory containing `.focal/`.
    pub fn find_root(start: &Path) -> Option<PathBuf> {
        let mut cur = start.to_path_buf();
        loop {
            if cur.join(".focal").is_dir() {
                return Some(cur);
            }
            if !cur.pop() {
                return None;
            }
        }
    }
}
