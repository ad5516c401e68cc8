//! Time-bounded cache in front of the aggregation scan.
//!
//! Fresh means: the entry was computed under the current write generation
//! and is younger than the freshness window. Anything else is a miss and
//! triggers a full re-read of the session log. Concurrent misses are
//! serialized behind one refresh lock; callers that waited re-check
//! freshness and reuse the snapshot computed ahead of them.

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use focal_ledger::SessionLog;
use serde::{Deserialize, Serialize};

use crate::aggregate::aggregate;
use crate::types::AnalyticsSnapshot;

#[derive(Debug, Clone)]
pub struct CacheOptions {
    /// Freshness window.
    pub ttl: Duration,
    /// Side file the snapshot is persisted to after each recomputation.
    pub side_file: Option<PathBuf>,
    /// Adopt the side file at construction when it still matches the log.
    pub warm_start: bool,
}

impl Default for CacheOptions {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(5 * 60),
            side_file: None,
            warm_start: false,
        }
    }
}

/// Point-in-time view of the cache for health checks and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStatus {
    pub computed_at: Option<DateTime<Utc>>,
    pub recomputations: u64,
    pub fresh: bool,
}

struct CacheEntry {
    snapshot: Arc<AnalyticsSnapshot>,
    computed_at: DateTime<Utc>,
    stored_at: Instant,
    generation: u64,
}

/// On-disk form of the side file.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CacheFile<S> {
    computed_at: DateTime<Utc>,
    /// Byte length of the session log when the snapshot was computed.
    log_length: u64,
    snapshot: S,
}

pub struct AnalyticsCache {
    log: Arc<SessionLog>,
    options: CacheOptions,
    generation: AtomicU64,
    recomputations: AtomicU64,
    entry: RwLock<Option<CacheEntry>>,
    refresh: Mutex<()>,
}

impl AnalyticsCache {
    pub fn new(log: Arc<SessionLog>, options: CacheOptions) -> Self {
        let cache = Self {
            log,
            options,
            generation: AtomicU64::new(0),
            recomputations: AtomicU64::new(0),
            entry: RwLock::new(None),
            refresh: Mutex::new(()),
        };
        if cache.options.warm_start {
            cache.warm_from_side_file();
        }
        cache
    }

    /// The current snapshot, recomputing it from the log on a miss.
    ///
    /// A log read failure leaves the cache empty and is returned as is.
    pub fn get(&self) -> focal_core::Result<Arc<AnalyticsSnapshot>> {
        if let Some(snapshot) = self.fresh_snapshot() {
            tracing::debug!("analytics cache hit");
            return Ok(snapshot);
        }

        let _refresh = self.refresh.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(snapshot) = self.fresh_snapshot() {
            tracing::debug!("analytics cache filled by concurrent refresh");
            return Ok(snapshot);
        }
        self.recompute()
    }

    /// Mark the held snapshot stale. Never blocks.
    pub fn invalidate(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        tracing::debug!("analytics cache invalidated");
    }

    /// The held snapshot if no write has landed since it was computed,
    /// regardless of age. No I/O.
    pub fn peek(&self) -> Option<Arc<AnalyticsSnapshot>> {
        let generation = self.generation.load(Ordering::SeqCst);
        let entry = self.entry.read().unwrap_or_else(|e| e.into_inner());
        entry
            .as_ref()
            .filter(|e| e.generation == generation)
            .map(|e| e.snapshot.clone())
    }

    pub fn status(&self) -> CacheStatus {
        let entry = self.entry.read().unwrap_or_else(|e| e.into_inner());
        CacheStatus {
            computed_at: entry.as_ref().map(|e| e.computed_at),
            recomputations: self.recomputations.load(Ordering::SeqCst),
            fresh: entry.as_ref().is_some_and(|e| self.is_fresh(e)),
        }
    }

    fn is_fresh(&self, entry: &CacheEntry) -> bool {
        entry.generation == self.generation.load(Ordering::SeqCst)
            && entry.stored_at.elapsed() < self.options.ttl
    }

    fn fresh_snapshot(&self) -> Option<Arc<AnalyticsSnapshot>> {
        let entry = self.entry.read().unwrap_or_else(|e| e.into_inner());
        entry
            .as_ref()
            .filter(|e| self.is_fresh(e))
            .map(|e| e.snapshot.clone())
    }

    /// Caller must hold the refresh lock.
    fn recompute(&self) -> focal_core::Result<Arc<AnalyticsSnapshot>> {
        let started = Instant::now();
        // Read the generation and length before the log so a concurrent
        // append can only make this entry look older, never newer.
        let generation = self.generation.load(Ordering::SeqCst);
        let log_length = self.log.len_bytes()?;
        let sessions = self.log.read_all()?;

        let snapshot = Arc::new(aggregate(&sessions));
        let computed_at = Utc::now();
        self.recomputations.fetch_add(1, Ordering::SeqCst);
        tracing::info!(
            sessions = sessions.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "analytics recomputed"
        );

        {
            let mut entry = self.entry.write().unwrap_or_else(|e| e.into_inner());
            *entry = Some(CacheEntry {
                snapshot: snapshot.clone(),
                computed_at,
                stored_at: Instant::now(),
                generation,
            });
        }

        self.persist(&snapshot, computed_at, log_length);
        Ok(snapshot)
    }

    /// Best-effort write of the side file; failures are logged only.
    fn persist(&self, snapshot: &AnalyticsSnapshot, computed_at: DateTime<Utc>, log_length: u64) {
        let Some(path) = &self.options.side_file else {
            return;
        };
        let file = CacheFile {
            computed_at,
            log_length,
            snapshot,
        };
        let result = serde_json::to_vec_pretty(&file)
            .map_err(anyhow::Error::from)
            .and_then(|bytes| focal_store::write_atomic(path, &bytes));
        if let Err(e) = result {
            tracing::warn!(path = %path.display(), error = %e, "failed to persist analytics cache");
        }
    }

    fn warm_from_side_file(&self) {
        let Some(path) = &self.options.side_file else {
            return;
        };
        match self.load_side_file() {
            Ok(Some(entry)) => {
                tracing::info!(path = %path.display(), "analytics cache warm-started");
                *self.entry.write().unwrap_or_else(|e| e.into_inner()) = Some(entry);
            }
            Ok(None) => {
                tracing::debug!(path = %path.display(), "analytics side file not reusable");
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "cannot read analytics side file");
            }
        }
    }

    fn load_side_file(&self) -> anyhow::Result<Option<CacheEntry>> {
        let Some(path) = &self.options.side_file else {
            return Ok(None);
        };
        let bytes = match std::fs::read(path) {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let file: CacheFile<AnalyticsSnapshot> = serde_json::from_slice(&bytes)?;

        if file.log_length != self.log.len_bytes()? {
            return Ok(None);
        }
        let Ok(age) = (Utc::now() - file.computed_at).to_std() else {
            return Ok(None);
        };
        if age >= self.options.ttl {
            return Ok(None);
        }
        let Some(stored_at) = Instant::now().checked_sub(age) else {
            return Ok(None);
        };

        Ok(Some(CacheEntry {
            snapshot: Arc::new(file.snapshot),
            computed_at: file.computed_at,
            stored_at,
            generation: self.generation.load(Ordering::SeqCst),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::session;

    fn setup(options: CacheOptions) -> (tempfile::TempDir, Arc<SessionLog>, AnalyticsCache) {
        let tmp = tempfile::tempdir().unwrap();
        let log = Arc::new(SessionLog::at(tmp.path().join("sessions.jsonl")));
        let options = CacheOptions {
            side_file: Some(tmp.path().join("analytics_cache.json")),
            ..options
        };
        let cache = AnalyticsCache::new(log.clone(), options);
        (tmp, log, cache)
    }

    #[test]
    fn starts_absent_and_computes_once_within_window() {
        let (_tmp, log, cache) = setup(CacheOptions::default());
        log.append(&session("a", "2024-01-01", "focus", 10.0)).unwrap();

        assert!(cache.peek().is_none());
        assert!(!cache.status().fresh);

        let first = cache.get().unwrap();
        assert_eq!(first.total_sessions, 1);
        assert_eq!(cache.status().recomputations, 1);

        // Appending without invalidating is invisible inside the window.
        log.append(&session("b", "2024-01-01", "focus", 10.0)).unwrap();
        let second = cache.get().unwrap();
        assert_eq!(second.total_sessions, 1);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.status().recomputations, 1);
    }

    #[test]
    fn peek_hides_snapshot_after_invalidate_but_not_after_expiry() {
        let (_tmp, log, cache) = setup(CacheOptions {
            ttl: Duration::ZERO,
            ..CacheOptions::default()
        });
        log.append(&session("a", "2024-01-01", "focus", 10.0)).unwrap();
        cache.get().unwrap();
        assert!(!cache.status().fresh);
        assert_eq!(cache.peek().unwrap().total_sessions, 1);

        cache.invalidate();
        assert!(cache.peek().is_none());
        assert!(cache.status().computed_at.is_some());
    }

    #[test]
    fn invalidate_forces_recompute() {
        let (_tmp, log, cache) = setup(CacheOptions::default());
        log.append(&session("a", "2024-01-01", "focus", 10.0)).unwrap();
        cache.get().unwrap();
        let before = cache.status();

        log.append(&session("b", "2024-01-02", "focus", 5.0)).unwrap();
        cache.invalidate();
        assert!(!cache.status().fresh);

        let snap = cache.get().unwrap();
        let after = cache.status();
        assert_eq!(snap.total_sessions, 2);
        assert_eq!(snap.total_focus_time, 15.0);
        assert_eq!(after.recomputations, before.recomputations + 1);
        assert!(after.computed_at >= before.computed_at);
        assert!(after.fresh);
    }

    #[test]
    fn zero_window_always_recomputes() {
        let (_tmp, _log, cache) = setup(CacheOptions {
            ttl: Duration::ZERO,
            ..CacheOptions::default()
        });
        cache.get().unwrap();
        cache.get().unwrap();
        assert_eq!(cache.status().recomputations, 2);
    }

    #[test]
    fn expired_entry_is_recomputed() {
        let (_tmp, _log, cache) = setup(CacheOptions {
            ttl: Duration::from_millis(20),
            ..CacheOptions::default()
        });
        cache.get().unwrap();
        std::thread::sleep(Duration::from_millis(40));
        assert!(!cache.status().fresh);
        cache.get().unwrap();
        assert_eq!(cache.status().recomputations, 2);
    }

    #[test]
    fn concurrent_misses_collapse_into_one_recompute() {
        let (_tmp, log, cache) = setup(CacheOptions::default());
        for i in 0..50 {
            log.append(&session(&format!("s{i}"), "2024-01-01", "focus", 1.0))
                .unwrap();
        }
        let cache = Arc::new(cache);
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = cache.clone();
                std::thread::spawn(move || cache.get().unwrap().total_sessions)
            })
            .collect();
        for h in handles {
            assert_eq!(h.join().unwrap(), 50);
        }
        assert_eq!(cache.status().recomputations, 1);
    }

    #[test]
    fn persists_side_file_on_recompute() {
        let (tmp, log, cache) = setup(CacheOptions::default());
        log.append(&session("a", "2024-01-01", "focus", 25.0)).unwrap();
        cache.get().unwrap();

        let body = std::fs::read_to_string(tmp.path().join("analytics_cache.json")).unwrap();
        let v: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(v["snapshot"]["totalSessions"], 1);
        assert_eq!(v["logLength"], log.len_bytes().unwrap());
        assert!(v["computedAt"].is_string());
    }

    #[test]
    fn persist_failure_does_not_fail_read() {
        let tmp = tempfile::tempdir().unwrap();
        let log = Arc::new(SessionLog::at(tmp.path().join("sessions.jsonl")));
        // A directory where the side file should be makes the rename fail.
        let side = tmp.path().join("analytics_cache.json");
        std::fs::create_dir_all(side.join("blocker")).unwrap();
        let cache = AnalyticsCache::new(
            log,
            CacheOptions {
                side_file: Some(side),
                ..CacheOptions::default()
            },
        );
        assert_eq!(cache.get().unwrap().total_sessions, 0);
    }

    #[test]
    fn side_file_is_ignored_without_warm_start() {
        let (tmp, log, cache) = setup(CacheOptions::default());
        log.append(&session("a", "2024-01-01", "focus", 25.0)).unwrap();
        cache.get().unwrap();
        drop(cache);

        let cold = AnalyticsCache::new(
            log,
            CacheOptions {
                side_file: Some(tmp.path().join("analytics_cache.json")),
                ..CacheOptions::default()
            },
        );
        assert!(cold.peek().is_none());
    }

    #[test]
    fn warm_start_adopts_matching_side_file() {
        let (tmp, log, cache) = setup(CacheOptions::default());
        log.append(&session("a", "2024-01-01", "focus", 25.0)).unwrap();
        let computed = cache.get().unwrap();
        drop(cache);

        let warm = AnalyticsCache::new(
            log,
            CacheOptions {
                side_file: Some(tmp.path().join("analytics_cache.json")),
                warm_start: true,
                ..CacheOptions::default()
            },
        );
        assert!(warm.status().fresh);
        assert_eq!(*warm.get().unwrap(), *computed);
        assert_eq!(warm.status().recomputations, 0);
    }

    #[test]
    fn warm_start_rejects_side_file_when_log_grew() {
        let (tmp, log, cache) = setup(CacheOptions::default());
        log.append(&session("a", "2024-01-01", "focus", 25.0)).unwrap();
        cache.get().unwrap();
        drop(cache);
        log.append(&session("b", "2024-01-02", "focus", 25.0)).unwrap();

        let warm = AnalyticsCache::new(
            log,
            CacheOptions {
                side_file: Some(tmp.path().join("analytics_cache.json")),
                warm_start: true,
                ..CacheOptions::default()
            },
        );
        assert!(warm.peek().is_none());
        assert_eq!(warm.get().unwrap().total_sessions, 2);
    }

    #[test]
    fn read_failure_is_returned_and_not_cached() {
        let tmp = tempfile::tempdir().unwrap();
        // A directory in place of the log file makes the read fail.
        let log_path = tmp.path().join("sessions.jsonl");
        std::fs::create_dir_all(&log_path).unwrap();
        let cache = AnalyticsCache::new(Arc::new(SessionLog::at(log_path)), CacheOptions::default());
        assert!(cache.get().is_err());
        assert!(cache.peek().is_none());
        assert_eq!(cache.status().recomputations, 0);
    }
}
