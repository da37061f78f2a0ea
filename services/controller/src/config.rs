//! Configuration for the controller.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};

use rgb_id::ObjectKey;

use crate::api::{RgbResource, DEFAULT_MANAGER_TAG};
use crate::factory::ItemTemplate;
use crate::reconciler::ReconcilerConfig;
use crate::worker::WorkerConfig;

/// Controller configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Value of the `app` label stamped on managed items.
    pub manager_tag: String,

    /// Container image for new items.
    pub item_image: String,

    /// Seconds between resync passes.
    pub resync_interval_secs: u64,

    /// First requeue delay in milliseconds.
    pub backoff_base_ms: u64,

    /// Requeue delay ceiling in seconds.
    pub backoff_max_secs: u64,

    /// JSON file with records to load into the in-memory store at startup.
    pub seed_file: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through `lookup`, which maps a variable name to
    /// its value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let manager_tag =
            lookup("RGB_MANAGER_TAG").unwrap_or_else(|| DEFAULT_MANAGER_TAG.to_string());

        let item_image = lookup("RGB_ITEM_IMAGE").unwrap_or_else(|| "nginx".to_string());

        let resync_interval_secs = parse_or(&lookup, "RGB_RESYNC_INTERVAL_SECS", 10)?;
        if resync_interval_secs == 0 {
            bail!("RGB_RESYNC_INTERVAL_SECS must be at least 1");
        }
        let backoff_base_ms = parse_or(&lookup, "RGB_BACKOFF_BASE_MS", 500)?;
        let backoff_max_secs = parse_or(&lookup, "RGB_BACKOFF_MAX_SECS", 300)?;

        let seed_file = lookup("RGB_SEED_FILE").map(PathBuf::from);

        let log_level = lookup("RGB_LOG_LEVEL").unwrap_or_else(|| "info".to_string());

        Ok(Self {
            manager_tag,
            item_image,
            resync_interval_secs,
            backoff_base_ms,
            backoff_max_secs,
            seed_file,
            log_level,
        })
    }

    pub fn reconciler_config(&self) -> ReconcilerConfig {
        ReconcilerConfig {
            manager_tag: self.manager_tag.clone(),
            template: ItemTemplate {
                image: self.item_image.clone(),
                ..ItemTemplate::default()
            },
        }
    }

    pub fn worker_config(&self) -> WorkerConfig {
        WorkerConfig {
            resync_interval: Duration::from_secs(self.resync_interval_secs),
            backoff_base: Duration::from_millis(self.backoff_base_ms),
            backoff_max: Duration::from_secs(self.backoff_max_secs),
        }
    }
}

fn parse_or<F>(lookup: &F, name: &str, default: u64) -> Result<u64>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        Some(raw) => raw
            .parse()
            .with_context(|| format!("{name} must be a non-negative integer, got '{raw}'")),
        None => Ok(default),
    }
}

/// Read a JSON array of records and apply admission checks to each.
pub fn load_seed_records(path: &Path) -> Result<Vec<RgbResource>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading seed file {}", path.display()))?;
    let records: Vec<RgbResource> = serde_json::from_str(&raw)
        .with_context(|| format!("parsing seed file {}", path.display()))?;

    for record in &records {
        ObjectKey::new(&record.metadata.namespace, &record.metadata.name)
            .with_context(|| format!("record {} rejected", record.key()))?;
        record
            .spec
            .validate()
            .with_context(|| format!("record {} rejected", record.key()))?;
    }

    Ok(records)
}
