mod cmd_config;
mod cmd_export;
mod cmd_init;
mod cmd_log;
mod cmd_serve;
mod cmd_stats;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use focal_ledger::FocalPaths;
use focal_store::FocalConfig;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "focal", version, about = "Focus session tracker with cached analytics")]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Initialize a new .focal/ workspace
    Init,
    /// Start the HTTP API server
    Serve {
        /// Bind address (defaults to config `bind`)
        #[arg(long)]
        bind: Option<String>,
        /// Port (defaults to config `port`)
        #[arg(long, env = "PORT")]
        port: Option<u16>,
        /// Directory of static files served for unmatched GET paths
        #[arg(long)]
        static_dir: Option<PathBuf>,
    },
    /// Record a completed focus session
    Log {
        /// Session type (e.g. "deep work")
        #[arg(long = "type")]
        session_type: String,
        /// Minutes actually focused
        #[arg(long)]
        actual: f64,
        /// Minutes planned
        #[arg(long)]
        planned: Option<f64>,
        /// Distraction label (repeatable)
        #[arg(long = "distraction")]
        distractions: Vec<String>,
        /// Mark the session as completed
        #[arg(long)]
        completed: bool,
    },
    /// Show analytics for the session log
    Stats {
        /// Output the full snapshot as JSON
        #[arg(long)]
        json: bool,
    },
    /// Dump every logged session as a JSON array
    Export {
        /// Write to a file instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Manage workspace config
    Config {
        #[command(subcommand)]
        cmd: cmd_config::ConfigCmd,
    },
}

/// Resolve an initialized workspace and its config.
pub(crate) fn open_workspace(repo_root: &Path) -> anyhow::Result<(FocalPaths, FocalConfig)> {
    let paths = FocalPaths::discover(repo_root);
    if !paths.is_initialized() {
        anyhow::bail!("No .focal/ workspace found. Run `focal init` first.");
    }
    let config = FocalConfig::load(&paths.config_json)?;
    Ok((paths, config))
}

/// Logs go to stderr so `stats --json` and `export` stay pipeable.
fn init_tracing(root: &Path) {
    let fallback = FocalConfig::load(&FocalPaths::discover(root).config_json)
        .map(|c| c.log_level)
        .unwrap_or_else(|_| "info".to_string());
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&fallback))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cwd = std::env::current_dir()?;
    let repo_root = FocalPaths::find_root(&cwd).unwrap_or(cwd);
    init_tracing(&repo_root);

    match cli.cmd {
        Command::Init => cmd_init::execute(&repo_root),
        Command::Serve {
            bind,
            port,
            static_dir,
        } => cmd_serve::execute(&repo_root, bind, port, static_dir),
        Command::Log {
            session_type,
            actual,
            planned,
            distractions,
            completed,
        } => cmd_log::execute(&cmd_log::LogParams {
            repo_root: &repo_root,
            session_type: &session_type,
            actual,
            planned,
            distractions: &distractions,
            completed,
        }),
        Command::Stats { json } => cmd_stats::execute(&repo_root, json),
        Command::Export { output } => cmd_export::execute(&repo_root, output.as_deref()),
        Command::Config { cmd } => cmd_config::run(cmd, &repo_root),
    }
}
