//! Reconcile errors.

use thiserror::Error;

use crate::api::UnsupportedKind;
use crate::store::StoreError;

/// Result type for reconcile passes.
pub type ReconcileResult<T> = Result<T, ReconcileError>;

/// Why a reconcile pass did not finish.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReconcileError {
    /// The record names a kind the controller cannot manage. Every retry
    /// fails the same way until the record is fixed.
    #[error(transparent)]
    UnsupportedKind(#[from] UnsupportedKind),

    /// A store call failed, including status write conflicts.
    #[error("store operation failed: {0}")]
    Store(#[from] StoreError),

    /// Shutdown was signalled mid-pass.
    #[error("reconcile cancelled")]
    Cancelled,
}

impl ReconcileError {
    /// Returns true if retrying the pass can succeed without the record
    /// changing.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::UnsupportedKind(_))
    }

    /// Returns true for an optimistic concurrency failure.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Store(StoreError::Conflict { .. }))
    }
}
