//! RGB resource manager controller.
//!
//! Keeps, for every desired-state record, a counted set of pods or
//! deployments labelled with the record's color.
//!
//! ## Modules
//!
//! - `api`: record and item types, ownership labels
//! - `factory`: builds new items
//! - `store`: the store interface and an in-memory implementation
//! - `reconciler`: one convergence pass per record
//! - `status`: writes readiness back to the record
//! - `worker`: periodic resync with per-record backoff

pub mod api;
pub mod config;
pub mod error;
pub mod factory;
pub mod reconciler;
pub mod status;
pub mod store;
pub mod worker;

// Re-export commonly used types
pub use error::{ReconcileError, ReconcileResult};
pub use reconciler::{Outcome, PassSummary, Reconciler, ReconcilerConfig};
pub use store::{ItemStore, MemoryStore, StoreError};
pub use worker::{Worker, WorkerConfig};
