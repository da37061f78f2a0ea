//! Count convergence planning.

/// Where a set of items stands relative to its desired count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConvergenceStatus {
    /// Observed count equals desired count.
    Converged,

    /// Fewer items than desired.
    ScaleUp { missing: u32 },

    /// More items than desired.
    ScaleDown { surplus: u32 },
}

impl ConvergenceStatus {
    /// Classify a desired/observed pair.
    pub fn classify(desired: u32, observed: u32) -> Self {
        match observed.cmp(&desired) {
            std::cmp::Ordering::Equal => Self::Converged,
            std::cmp::Ordering::Less => Self::ScaleUp {
                missing: desired - observed,
            },
            std::cmp::Ordering::Greater => Self::ScaleDown {
                surplus: observed - desired,
            },
        }
    }

    /// Returns true if no work is needed.
    pub fn is_converged(&self) -> bool {
        matches!(self, Self::Converged)
    }
}

/// A single store mutation the caller should perform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action<T> {
    /// Create one new item. `ordinal` numbers the creates within the plan
    /// (0-based) and is only meant for logging.
    Create { ordinal: u32 },

    /// Delete this observed item.
    Delete(T),
}

impl<T> Action<T> {
    pub fn is_create(&self) -> bool {
        matches!(self, Self::Create { .. })
    }

    pub fn is_delete(&self) -> bool {
        matches!(self, Self::Delete(_))
    }
}

/// The ordered actions for one reconcile pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvergencePlan<T> {
    pub desired: u32,
    pub observed: u32,
    pub actions: Vec<Action<T>>,
}

impl<T> ConvergencePlan<T> {
    pub fn status(&self) -> ConvergenceStatus {
        ConvergenceStatus::classify(self.desired, self.observed)
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn creates(&self) -> usize {
        self.actions.iter().filter(|a| a.is_create()).count()
    }

    pub fn deletes(&self) -> usize {
        self.actions.iter().filter(|a| a.is_delete()).count()
    }

    /// Count the caller should observe once every action has been applied.
    pub fn expected_count(&self) -> u32 {
        let creates = self.creates() as u32;
        let deletes = self.deletes() as u32;
        self.observed + creates - deletes
    }
}

/// Compute the actions that move `observed` to `desired` items.
///
/// Surplus items are taken from the front of `observed` in the order given.
/// That order is whatever the store returned and callers must not rely on
/// which items survive.
pub fn plan<T>(desired: u32, observed: Vec<T>) -> ConvergencePlan<T> {
    let observed_count = u32::try_from(observed.len()).unwrap_or(u32::MAX);

    let actions = match ConvergenceStatus::classify(desired, observed_count) {
        ConvergenceStatus::Converged => Vec::new(),
        ConvergenceStatus::ScaleUp { missing } => (0..missing)
            .map(|ordinal| Action::Create { ordinal })
            .collect(),
        ConvergenceStatus::ScaleDown { surplus } => observed
            .into_iter()
            .take(surplus as usize)
            .map(Action::Delete)
            .collect(),
    };

    ConvergencePlan {
        desired,
        observed: observed_count,
        actions,
    }
}
