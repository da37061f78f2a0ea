//! In-memory item store.
//!
//! Behaves like the real store where the reconciler can tell the difference:
//! it assigns record UIDs and resource versions, rejects stale status writes,
//! rejects duplicate item names, and cascades record deletion to owned items.
//! It also records every call and can be told to fail specific calls.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use rgb_id::ObjectKey;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};

use super::{ItemStore, StoreError, StoreResult};
use crate::api::{ItemKind, ManagedItem, OwnerSelector, RgbResource};

/// A call made against the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreOp {
    GetRecord(ObjectKey),
    ListRecords,
    ListItems { namespace: String, kind: ItemKind },
    CreateItem(String),
    DeleteItem(String),
    UpdateStatus(ObjectKey),
}

impl StoreOp {
    /// Returns true for calls that change store contents.
    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            Self::CreateItem(_) | Self::DeleteItem(_) | Self::UpdateStatus(_)
        )
    }
}

/// Injected failures. Call numbers are 1-based and count every call of that
/// kind since the fault was armed.
#[derive(Debug, Default)]
struct Faults {
    fail_create_at: Option<usize>,
    creates_seen: usize,
    fail_delete_at: Option<usize>,
    deletes_seen: usize,
    fail_lists: bool,
    conflict_next_update: bool,
}

type ItemKey = (String, ItemKind, String);

fn item_key(item: &ManagedItem) -> ItemKey {
    (
        item.namespace().to_string(),
        item.kind(),
        item.name().to_string(),
    )
}

/// In-memory [`ItemStore`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<BTreeMap<ObjectKey, RgbResource>>,
    items: RwLock<BTreeMap<ItemKey, ManagedItem>>,
    ops: Mutex<Vec<StoreOp>>,
    faults: Mutex<Faults>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Admit a record, as the API server would on create. Assigns a fresh
    /// resource version and creation timestamp; keeps the record's UID.
    pub async fn insert_record(&self, mut record: RgbResource) -> RgbResource {
        record.metadata.resource_version = 1;
        record.metadata.creation_timestamp = Some(Utc::now());

        let key = record.key();
        info!(record = %key, kind = %record.spec.kind, count = record.spec.count, "Record admitted");
        self.records.write().await.insert(key, record.clone());
        record
    }

    /// Change a record's spec, bumping its resource version.
    pub async fn update_spec<F>(&self, key: &ObjectKey, edit: F) -> StoreResult<RgbResource>
    where
        F: FnOnce(&mut crate::api::RgbResourceSpec),
    {
        let mut records = self.records.write().await;
        let record = records
            .get_mut(key)
            .ok_or_else(|| StoreError::NotFound(key.to_string()))?;
        edit(&mut record.spec);
        record.metadata.resource_version += 1;
        Ok(record.clone())
    }

    /// Delete a record and, like the garbage collector, every item whose
    /// controller reference points at it. Returns the number of items removed.
    pub async fn delete_record(&self, key: &ObjectKey) -> StoreResult<usize> {
        let record = self
            .records
            .write()
            .await
            .remove(key)
            .ok_or_else(|| StoreError::NotFound(key.to_string()))?;

        let uid = record.metadata.uid;
        let mut items = self.items.write().await;
        let before = items.len();
        items.retain(|_, item| item.controller_uid() != Some(uid));
        let collected = before - items.len();

        info!(record = %key, collected, "Record deleted, owned items collected");
        Ok(collected)
    }

    /// Place an item directly, bypassing the call log and faults.
    pub async fn insert_item(&self, mut item: ManagedItem) {
        item.metadata.creation_timestamp.get_or_insert_with(Utc::now);
        self.items.write().await.insert(item_key(&item), item);
    }

    /// Remove an item directly, as an outside actor would.
    pub async fn remove_item(&self, namespace: &str, kind: ItemKind, name: &str) -> bool {
        self.items
            .write()
            .await
            .remove(&(namespace.to_string(), kind, name.to_string()))
            .is_some()
    }

    /// Current copy of a record.
    pub async fn record(&self, key: &ObjectKey) -> Option<RgbResource> {
        self.records.read().await.get(key).cloned()
    }

    /// Every item, in enumeration order.
    pub async fn items(&self) -> Vec<ManagedItem> {
        self.items.read().await.values().cloned().collect()
    }

    /// Items matching a selector, regardless of kind or namespace.
    pub async fn items_matching(&self, selector: &OwnerSelector) -> Vec<ManagedItem> {
        self.items
            .read()
            .await
            .values()
            .filter(|item| selector.matches(&item.metadata.labels))
            .cloned()
            .collect()
    }

    /// Calls made so far.
    pub async fn operations(&self) -> Vec<StoreOp> {
        self.ops.lock().await.clone()
    }

    /// Number of mutating calls made so far, including failed ones.
    pub async fn mutation_count(&self) -> usize {
        self.ops.lock().await.iter().filter(|op| op.is_mutation()).count()
    }

    pub async fn clear_operations(&self) {
        self.ops.lock().await.clear();
    }

    /// Fail the `n`th create call from now on.
    pub async fn fail_nth_create(&self, n: usize) {
        let mut faults = self.faults.lock().await;
        faults.fail_create_at = Some(n);
        faults.creates_seen = 0;
    }

    /// Fail the `n`th delete call from now on.
    pub async fn fail_nth_delete(&self, n: usize) {
        let mut faults = self.faults.lock().await;
        faults.fail_delete_at = Some(n);
        faults.deletes_seen = 0;
    }

    /// Make every list call fail until cleared.
    pub async fn set_fail_lists(&self, fail: bool) {
        self.faults.lock().await.fail_lists = fail;
    }

    /// Reject the next status write with a conflict.
    pub async fn conflict_next_status_update(&self) {
        self.faults.lock().await.conflict_next_update = true;
    }

    async fn log(&self, op: StoreOp) {
        self.ops.lock().await.push(op);
    }
}

#[async_trait]
impl ItemStore for MemoryStore {
    async fn get_record(&self, key: &ObjectKey) -> StoreResult<Option<RgbResource>> {
        self.log(StoreOp::GetRecord(key.clone())).await;
        Ok(self.records.read().await.get(key).cloned())
    }

    async fn list_records(&self) -> StoreResult<Vec<RgbResource>> {
        self.log(StoreOp::ListRecords).await;
        if self.faults.lock().await.fail_lists {
            return Err(StoreError::Unavailable("injected list failure".to_string()));
        }
        Ok(self.records.read().await.values().cloned().collect())
    }

    async fn list_items(
        &self,
        namespace: &str,
        kind: ItemKind,
        selector: &OwnerSelector,
    ) -> StoreResult<Vec<ManagedItem>> {
        self.log(StoreOp::ListItems {
            namespace: namespace.to_string(),
            kind,
        })
        .await;
        if self.faults.lock().await.fail_lists {
            return Err(StoreError::Unavailable("injected list failure".to_string()));
        }

        let items = self.items.read().await;
        let matched: Vec<_> = items
            .iter()
            .filter(|((ns, k, _), item)| {
                ns == namespace && *k == kind && selector.matches(&item.metadata.labels)
            })
            .map(|(_, item)| item.clone())
            .collect();

        debug!(namespace, %kind, %selector, count = matched.len(), "Listed items");
        Ok(matched)
    }

    async fn create_item(&self, mut item: ManagedItem) -> StoreResult<ManagedItem> {
        self.log(StoreOp::CreateItem(item.name().to_string())).await;
        {
            let mut faults = self.faults.lock().await;
            faults.creates_seen += 1;
            if faults.fail_create_at == Some(faults.creates_seen) {
                return Err(StoreError::Unavailable(format!(
                    "injected failure creating {}",
                    item.name()
                )));
            }
        }

        let key = item_key(&item);
        let mut items = self.items.write().await;
        if items.contains_key(&key) {
            return Err(StoreError::AlreadyExists(item.name().to_string()));
        }

        item.metadata.creation_timestamp = Some(Utc::now());
        items.insert(key, item.clone());
        Ok(item)
    }

    async fn delete_item(&self, item: &ManagedItem) -> StoreResult<()> {
        self.log(StoreOp::DeleteItem(item.name().to_string())).await;
        {
            let mut faults = self.faults.lock().await;
            faults.deletes_seen += 1;
            if faults.fail_delete_at == Some(faults.deletes_seen) {
                return Err(StoreError::Unavailable(format!(
                    "injected failure deleting {}",
                    item.name()
                )));
            }
        }

        self.items
            .write()
            .await
            .remove(&item_key(item))
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(item.name().to_string()))
    }

    async fn update_status(&self, record: &RgbResource) -> StoreResult<RgbResource> {
        let key = record.key();
        self.log(StoreOp::UpdateStatus(key.clone())).await;

        let injected = std::mem::take(&mut self.faults.lock().await.conflict_next_update);

        let mut records = self.records.write().await;
        let stored = records
            .get_mut(&key)
            .ok_or_else(|| StoreError::NotFound(key.to_string()))?;

        let expected = record.metadata.resource_version;
        let actual = stored.metadata.resource_version;
        if injected || expected != actual {
            return Err(StoreError::Conflict {
                key: key.to_string(),
                expected,
                actual: if injected { actual + 1 } else { actual },
            });
        }

        // Status subresource: only the status changes.
        stored.status = record.status.clone();
        stored.metadata.resource_version += 1;
        Ok(stored.clone())
    }
}
