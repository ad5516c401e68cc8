pub mod ledger;
pub mod lock;
pub mod paths;

pub use ledger::SessionLog;
pub use lock::WorkspaceLock;
pub use paths::FocalPaths;
