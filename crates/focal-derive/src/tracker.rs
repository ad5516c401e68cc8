use std::sync::Arc;

use chrono::Utc;
use focal_core::{admit, ClientInfo, SessionRecord};
use focal_ledger::{FocalPaths, SessionLog};
use focal_store::FocalConfig;
use serde::Serialize;
use serde_json::Value;

use crate::cache::{AnalyticsCache, CacheOptions};
use crate::types::AnalyticsSnapshot;

/// Error marker carried by the zeroed snapshot on the degraded read path.
pub const ANALYTICS_UNAVAILABLE: &str = "Failed to load analytics";

#[derive(Debug, Clone, Serialize)]
pub struct SubmitReceipt {
    pub id: String,
}

/// The session log plus its analytics cache.
///
/// Writes go log first, cache second: the cache is invalidated only after
/// the append is on disk.
pub struct Tracker {
    log: Arc<SessionLog>,
    cache: AnalyticsCache,
}

impl Tracker {
    pub fn new(log: Arc<SessionLog>, options: CacheOptions) -> Self {
        let cache = AnalyticsCache::new(log.clone(), options);
        Self { log, cache }
    }

    /// Open the tracker for an initialized workspace using its config.
    pub fn open(paths: &FocalPaths, config: &FocalConfig) -> anyhow::Result<Self> {
        let log = SessionLog::open(paths)?.with_fsync(config.fsync);
        let options = CacheOptions {
            ttl: config.cache_ttl(),
            side_file: Some(paths.analytics_cache_json.clone()),
            warm_start: config.warm_start,
        };
        Ok(Self::new(Arc::new(log), options))
    }

    /// Validate, append, then invalidate. Nothing is written on rejection.
    pub fn submit_session(
        &self,
        payload: &Value,
        client: ClientInfo,
    ) -> focal_core::Result<SubmitReceipt> {
        let record = admit(payload, client, Utc::now())?;
        self.log.append(&record)?;
        self.cache.invalidate();

        tracing::info!(
            id = %record.id,
            session_type = %record.session_type,
            minutes = record.actual_duration,
            distractions = record.distraction_count,
            "session logged"
        );
        Ok(SubmitReceipt { id: record.id })
    }

    /// Current analytics. Never fails: a log read error yields a zeroed
    /// snapshot with an error marker, which is not cached.
    pub fn analytics(&self) -> Arc<AnalyticsSnapshot> {
        match self.cache.get() {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::error!(error = %e, "failed to compute analytics");
                Arc::new(AnalyticsSnapshot::failed(ANALYTICS_UNAVAILABLE))
            }
        }
    }

    /// Every record in log order. Unlike `analytics`, a corrupt line fails.
    pub fn export_all(&self) -> focal_core::Result<Vec<SessionRecord>> {
        self.log.read_all_strict()
    }

    pub fn cache(&self) -> &AnalyticsCache {
        &self.cache
    }

    pub fn log(&self) -> &SessionLog {
        &self.log
    }
}
