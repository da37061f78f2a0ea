//! Reconciliation primitives.
//!
//! This library holds the pure parts of the controller:
//!
//! - **Planning**: [`plan`] turns a desired count and the observed items into
//!   a [`ConvergencePlan`] of create/delete actions.
//! - **Backoff**: [`BackoffTracker`] computes per-record requeue delays for
//!   the driver that invokes reconcile passes.
//!
//! # Invariants
//!
//! - Planning never performs I/O
//! - A plan holds exactly `|desired - observed|` actions, all of one type
//! - Only the resulting count is guaranteed; which surplus items are deleted
//!   is left to the store's enumeration order

mod backoff;
mod plan;

pub use backoff::BackoffTracker;
pub use plan::{plan, Action, ConvergencePlan, ConvergenceStatus};

use std::time::Duration;

/// Default interval between resync passes over all records.
pub const DEFAULT_RESYNC_INTERVAL: Duration = Duration::from_secs(10);

/// Default delay after a record's first failed pass.
pub const DEFAULT_BACKOFF_BASE: Duration = Duration::from_millis(500);

/// Default ceiling for the requeue delay.
pub const DEFAULT_BACKOFF_MAX: Duration = Duration::from_secs(5 * 60);
