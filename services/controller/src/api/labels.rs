//! Ownership labels.
//!
//! The reconciler counts an item as belonging to a record only by its
//! labels, never by owner reference. Removing either selector label from an
//! item outside the controller orphans it.

use std::collections::BTreeMap;
use std::fmt;

use super::resource::{Color, RgbResource};

/// Label carrying the controller-wide manager tag.
pub const APP_LABEL: &str = "app";

/// Label carrying the owning record's name.
pub const OWNER_LABEL: &str = "rgb.example.com/owner";

/// Label carrying the record's color.
pub const COLOR_LABEL: &str = "color";

/// Manager tag used when none is configured.
pub const DEFAULT_MANAGER_TAG: &str = "rgb";

/// Equality selector matching the items a record owns.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OwnerSelector {
    app: String,
    owner: String,
}

impl OwnerSelector {
    pub fn new(app: impl Into<String>, owner: impl Into<String>) -> Self {
        Self {
            app: app.into(),
            owner: owner.into(),
        }
    }

    pub fn for_record(manager_tag: &str, record: &RgbResource) -> Self {
        Self::new(manager_tag, record.metadata.name.clone())
    }

    /// Returns true if every selector label is present with the same value.
    pub fn matches(&self, labels: &BTreeMap<String, String>) -> bool {
        labels.get(APP_LABEL).map(String::as_str) == Some(self.app.as_str())
            && labels.get(OWNER_LABEL).map(String::as_str) == Some(self.owner.as_str())
    }

    pub fn to_labels(&self) -> BTreeMap<String, String> {
        BTreeMap::from([
            (APP_LABEL.to_string(), self.app.clone()),
            (OWNER_LABEL.to_string(), self.owner.clone()),
        ])
    }
}

impl fmt::Display for OwnerSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{APP_LABEL}={},{OWNER_LABEL}={}", self.app, self.owner)
    }
}

/// Full label set stamped on an item at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnershipLabels {
    selector: OwnerSelector,
    color: Color,
}

impl OwnershipLabels {
    pub fn new(selector: OwnerSelector, color: Color) -> Self {
        Self { selector, color }
    }

    pub fn selector(&self) -> &OwnerSelector {
        &self.selector
    }

    pub fn to_labels(&self) -> BTreeMap<String, String> {
        let mut labels = self.selector.to_labels();
        labels.insert(COLOR_LABEL.to_string(), self.color.as_str().to_string());
        labels
    }
}
