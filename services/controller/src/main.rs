//! RGB resource manager controller.
//!
//! Runs the resync worker against an in-memory store, optionally seeded
//! from `RGB_SEED_FILE`. Shuts down on Ctrl-C.

use std::sync::Arc;

use anyhow::Result;
use rgb_controller::config::{load_seed_records, Config};
use rgb_controller::{MemoryStore, Reconciler, Worker};
use tokio::sync::watch;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| config.log_level.clone().into()))
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    info!(
        manager_tag = %config.manager_tag,
        item_image = %config.item_image,
        resync_interval_secs = config.resync_interval_secs,
        "Starting rgb-controller"
    );

    let store = Arc::new(MemoryStore::new());
    if let Some(path) = &config.seed_file {
        let records = load_seed_records(path)?;
        info!(path = %path.display(), count = records.len(), "Seeding records");
        for record in records {
            store.insert_record(record).await;
        }
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let reconciler = Reconciler::new(store.clone(), config.reconciler_config())
        .with_cancellation(shutdown_rx.clone());
    let worker = Worker::new(store.clone(), reconciler, config.worker_config());

    let worker_handle = tokio::spawn({
        let shutdown_rx = shutdown_rx.clone();
        async move {
            worker.run(shutdown_rx).await;
        }
    });

    tokio::signal::ctrl_c().await?;
    info!("Received shutdown signal");

    let _ = shutdown_tx.send(true);
    if let Err(e) = worker_handle.await {
        error!(error = %e, "Worker task panicked");
    }

    info!("Controller shutdown complete");
    Ok(())
}
