//! Resync worker.
//!
//! Stands in for a watch-driven work queue: on every tick it lists all
//! records and runs one pass for each record whose backoff has elapsed.
//! Records are reconciled one after another, so a record never has two
//! passes in flight.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use rgb_reconcile::{BackoffTracker, DEFAULT_BACKOFF_BASE, DEFAULT_BACKOFF_MAX, DEFAULT_RESYNC_INTERVAL};
use tokio::sync::{watch, Mutex};
use tracing::{debug, error, info, instrument, warn};

use crate::reconciler::{Outcome, Reconciler};
use crate::store::{ItemStore, StoreResult};

/// Worker configuration.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Interval between resync passes.
    pub resync_interval: Duration,

    /// Delay after a record's first failed pass.
    pub backoff_base: Duration,

    /// Ceiling for the requeue delay.
    pub backoff_max: Duration,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            resync_interval: DEFAULT_RESYNC_INTERVAL,
            backoff_base: DEFAULT_BACKOFF_BASE,
            backoff_max: DEFAULT_BACKOFF_MAX,
        }
    }
}

/// Counters for one resync pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResyncStats {
    pub records_seen: usize,
    pub reconciled: usize,
    pub requeued: usize,
    /// Records still waiting out their backoff.
    pub deferred: usize,
}

/// Periodic resync worker.
pub struct Worker {
    store: Arc<dyn ItemStore>,
    reconciler: Reconciler,
    interval: Duration,
    backoff: Mutex<BackoffTracker>,
}

impl Worker {
    pub fn new(store: Arc<dyn ItemStore>, reconciler: Reconciler, config: WorkerConfig) -> Self {
        Self {
            store,
            reconciler,
            interval: config.resync_interval,
            backoff: Mutex::new(BackoffTracker::new(config.backoff_base, config.backoff_max)),
        }
    }

    /// Run the worker until shutdown is signaled.
    #[instrument(skip(self, shutdown))]
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        info!(
            interval_secs = self.interval.as_secs(),
            "Starting resync worker"
        );

        let mut interval = tokio::time::interval(self.interval);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    if let Err(e) = self.resync().await {
                        error!(error = %e, "Resync failed");
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!("Resync worker shutting down");
                        break;
                    }
                }
            }
        }
    }

    /// Reconcile every record that is due.
    pub async fn resync(&self) -> StoreResult<ResyncStats> {
        let records = self.store.list_records().await?;
        let mut stats = ResyncStats {
            records_seen: records.len(),
            ..ResyncStats::default()
        };

        let live: BTreeSet<String> = records.iter().map(|r| r.key().to_string()).collect();
        self.backoff
            .lock()
            .await
            .retain_keys(|k| live.contains(k));

        for record in records {
            let key = record.key();
            let key_str = key.to_string();

            if !self.backoff.lock().await.is_due(&key_str) {
                debug!(record = %key, "Record in backoff, deferring");
                stats.deferred += 1;
                continue;
            }

            match self.reconciler.reconcile(&key).await {
                Outcome::Done => {
                    self.backoff.lock().await.clear(&key_str);
                    stats.reconciled += 1;
                }
                Outcome::Requeue(e) => {
                    let delay = self.backoff.lock().await.record_failure(&key_str);
                    warn!(
                        record = %key,
                        error = %e,
                        delay_ms = delay.as_millis() as u64,
                        "Record requeued"
                    );
                    stats.requeued += 1;
                }
            }
        }

        if stats.requeued > 0 || stats.deferred > 0 {
            info!(
                records_seen = stats.records_seen,
                reconciled = stats.reconciled,
                requeued = stats.requeued,
                deferred = stats.deferred,
                "Resync complete"
            );
        } else {
            debug!(records_seen = stats.records_seen, "Resync complete");
        }

        Ok(stats)
    }

    /// Consecutive failures recorded for a record key (`namespace/name`).
    pub async fn failures(&self, key: &str) -> u32 {
        self.backoff.lock().await.failures(key)
    }
}
