//! The reconciler.
//!
//! One call to [`Reconciler::reconcile`] is one pass for one record:
//! - Fetch the record (gone means nothing to do)
//! - Parse its kind
//! - List the items its ownership selector matches
//! - Plan and apply creates/deletes one at a time, stopping at the first error
//! - Mark the record Ready once the count matches
//!
//! Nothing is cached between passes. Partial progress from a failed pass is
//! picked up by the next one.

use std::sync::Arc;

use rgb_id::ObjectKey;
use rgb_reconcile::{plan, Action, ConvergenceStatus};
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

use crate::api::{OwnerSelector, OwnershipLabels, DEFAULT_MANAGER_TAG};
use crate::error::{ReconcileError, ReconcileResult};
use crate::factory::{ItemFactory, ItemTemplate};
use crate::status::StatusReporter;
use crate::store::ItemStore;

/// Reconciler configuration.
#[derive(Debug, Clone)]
pub struct ReconcilerConfig {
    /// Value of the `app` label on every managed item.
    pub manager_tag: String,

    /// Container template for new items.
    pub template: ItemTemplate,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            manager_tag: DEFAULT_MANAGER_TAG.to_string(),
            template: ItemTemplate::default(),
        }
    }
}

/// What the scheduler should do after a pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Nothing more to do until the next change.
    Done,

    /// The pass failed; retry with backoff.
    Requeue(ReconcileError),
}

impl Outcome {
    pub fn is_done(&self) -> bool {
        matches!(self, Self::Done)
    }
}

/// What a successful pass did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassSummary {
    /// False if the record no longer exists.
    pub record_found: bool,
    pub observed: u32,
    pub created: u32,
    pub deleted: u32,
    /// True if this pass wrote `Ready` to the record.
    pub marked_ready: bool,
}

/// Converges one record's items to its desired count.
pub struct Reconciler {
    store: Arc<dyn ItemStore>,
    factory: ItemFactory,
    status: StatusReporter,
    manager_tag: String,
    cancel: watch::Receiver<bool>,
}

impl Reconciler {
    /// Create a reconciler that is never cancelled.
    pub fn new(store: Arc<dyn ItemStore>, config: ReconcilerConfig) -> Self {
        let (_tx, cancel) = watch::channel(false);
        Self {
            status: StatusReporter::new(Arc::clone(&store)),
            store,
            factory: ItemFactory::new(config.template),
            manager_tag: config.manager_tag,
            cancel,
        }
    }

    /// Abort passes once `cancel` reads true.
    pub fn with_cancellation(mut self, cancel: watch::Receiver<bool>) -> Self {
        self.cancel = cancel;
        self
    }

    /// Run one pass and fold the result into an [`Outcome`].
    pub async fn reconcile(&self, key: &ObjectKey) -> Outcome {
        match self.run_pass(key).await {
            Ok(_) => Outcome::Done,
            Err(e) => {
                warn!(
                    record = %key,
                    error = %e,
                    retryable = e.is_retryable(),
                    "Reconcile failed, requeueing"
                );
                Outcome::Requeue(e)
            }
        }
    }

    /// Run one pass.
    #[instrument(skip(self, key), fields(record = %key))]
    pub async fn run_pass(&self, key: &ObjectKey) -> ReconcileResult<PassSummary> {
        let Some(record) = self.store.get_record(key).await? else {
            debug!("Record not found, nothing to reconcile");
            return Ok(PassSummary::default());
        };

        let kind = record.spec.item_kind()?;
        let namespace = record.metadata.namespace.as_str();
        let selector = OwnerSelector::for_record(&self.manager_tag, &record);

        let observed = self.store.list_items(namespace, kind, &selector).await?;
        let plan = plan(record.spec.count, observed);

        info!(
            %kind,
            color = %record.spec.color,
            desired = plan.desired,
            observed = plan.observed,
            status = ?plan.status(),
            actions = plan.len(),
            "Reconciling record"
        );

        let mut summary = PassSummary {
            record_found: true,
            observed: plan.observed,
            ..PassSummary::default()
        };

        let labels = OwnershipLabels::new(selector, record.spec.color);
        let desired = plan.desired;

        for action in plan.actions {
            self.check_cancelled()?;

            match action {
                Action::Create { ordinal } => {
                    let item =
                        self.factory
                            .build(kind, namespace, &labels, record.owner_reference());
                    let name = item.metadata.name.clone();
                    if let Err(e) = self.store.create_item(item).await {
                        warn!(item = %name, ordinal, error = %e, "Failed to create item");
                        return Err(e.into());
                    }
                    info!(item = %name, ordinal, "Created item");
                    summary.created += 1;
                }
                Action::Delete(item) => {
                    if let Err(e) = self.store.delete_item(&item).await {
                        warn!(item = %item.name(), error = %e, "Failed to delete item");
                        return Err(e.into());
                    }
                    info!(item = %item.name(), "Deleted item");
                    summary.deleted += 1;
                }
            }
        }

        let remaining = summary.observed + summary.created - summary.deleted;
        if !ConvergenceStatus::classify(desired, remaining).is_converged() {
            return Ok(summary);
        }

        if record.status.result.is_ready() {
            debug!("Record already Ready");
        } else {
            self.check_cancelled()?;
            self.status.mark_ready(&record).await?;
            summary.marked_ready = true;
        }

        Ok(summary)
    }

    fn check_cancelled(&self) -> ReconcileResult<()> {
        if *self.cancel.borrow() {
            return Err(ReconcileError::Cancelled);
        }
        Ok(())
    }
}
