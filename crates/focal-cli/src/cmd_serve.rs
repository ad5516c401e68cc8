use std::path::{Path, PathBuf};

use focal_serve::ServeConfig;

pub fn execute(
    repo_root: &Path,
    bind: Option<String>,
    port: Option<u16>,
    static_dir: Option<PathBuf>,
) -> anyhow::Result<()> {
    let (_, config) = crate::open_workspace(repo_root)?;
    let serve_config = ServeConfig {
        bind: bind.unwrap_or(config.bind),
        port: port.unwrap_or(config.port),
        static_dir: static_dir.or(config.static_dir),
    };
    tokio::runtime::Runtime::new()?.block_on(focal_serve::serve(repo_root, serve_config))
}
