//! Item store interface.
//!
//! The reconciler talks to the store only through [`ItemStore`]. Every call
//! is a suspension point; a failure of any call aborts the current pass.
//!
//! [`MemoryStore`] is the bundled implementation used by the dev binary and
//! the tests.

mod memory;

pub use memory::{MemoryStore, StoreOp};

use async_trait::async_trait;
use rgb_id::ObjectKey;
use thiserror::Error;

use crate::api::{ItemKind, ManagedItem, OwnerSelector, RgbResource};

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors returned by the store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("already exists: {0}")]
    AlreadyExists(String),

    /// Optimistic concurrency check failed on a record write.
    #[error("conflict updating {key}: expected resource version {expected}, found {actual}")]
    Conflict {
        key: String,
        expected: u64,
        actual: u64,
    },

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Capabilities the reconciler needs from the store.
#[async_trait]
pub trait ItemStore: Send + Sync {
    /// Fetch a record. `Ok(None)` means it does not exist.
    async fn get_record(&self, key: &ObjectKey) -> StoreResult<Option<RgbResource>>;

    /// All records, for periodic resync.
    async fn list_records(&self) -> StoreResult<Vec<RgbResource>>;

    /// Items of `kind` in `namespace` carrying every `selector` label, in
    /// store enumeration order.
    async fn list_items(
        &self,
        namespace: &str,
        kind: ItemKind,
        selector: &OwnerSelector,
    ) -> StoreResult<Vec<ManagedItem>>;

    async fn create_item(&self, item: ManagedItem) -> StoreResult<ManagedItem>;

    async fn delete_item(&self, item: &ManagedItem) -> StoreResult<()>;

    /// Write the record's status. Fails with [`StoreError::Conflict`] when
    /// `record.metadata.resource_version` is stale.
    async fn update_status(&self, record: &RgbResource) -> StoreResult<RgbResource>;
}
