//! Persists readiness onto the record.

use std::sync::Arc;

use tracing::{info, warn};

use crate::api::{Readiness, RgbResource};
use crate::store::{ItemStore, StoreResult};

/// Writes `status.result` through the store's status update.
///
/// A conflict means the record changed since it was read. The caller retries
/// the whole pass rather than the write, since the counts may have moved.
#[derive(Clone)]
pub struct StatusReporter {
    store: Arc<dyn ItemStore>,
}

impl StatusReporter {
    pub fn new(store: Arc<dyn ItemStore>) -> Self {
        Self { store }
    }

    /// Mark the record Ready. Returns the stored record.
    pub async fn mark_ready(&self, record: &RgbResource) -> StoreResult<RgbResource> {
        let mut updated = record.clone();
        updated.status.result = Readiness::Ready;

        match self.store.update_status(&updated).await {
            Ok(stored) => {
                info!(
                    record = %record.key(),
                    resource_version = stored.metadata.resource_version,
                    "Record marked Ready"
                );
                Ok(stored)
            }
            Err(e) => {
                warn!(record = %record.key(), error = %e, "Failed to mark record Ready");
                Err(e)
            }
        }
    }
}
