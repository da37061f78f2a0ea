//! The desired-state record.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rgb_id::{ObjectKey, RecordUid};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::item::OwnerReference;

/// API version stamped on owner references.
pub const API_VERSION: &str = "kd.kb.example.com/v1";

/// Kind name of the desired-state record.
pub const RESOURCE_KIND: &str = "RGBResourceManager";

/// Color applied to every managed item of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Color {
    #[default]
    Red,
    Green,
    Blue,
}

impl Color {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Red => "Red",
            Self::Green => "Green",
            Self::Blue => "Blue",
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kinds of items the controller knows how to manage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ItemKind {
    Pod,
    Deployment,
}

impl ItemKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pod => "Pod",
            Self::Deployment => "Deployment",
        }
    }

    /// API group the kind lives in.
    pub fn group(&self) -> ApiGroup {
        match self {
            Self::Pod => ApiGroup::Core,
            Self::Deployment => ApiGroup::Apps,
        }
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A `kind` value outside the supported set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unsupported kind '{0}': expected Pod or Deployment")]
pub struct UnsupportedKind(pub String);

impl FromStr for ItemKind {
    type Err = UnsupportedKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pod" => Ok(Self::Pod),
            "Deployment" => Ok(Self::Deployment),
            other => Err(UnsupportedKind(other.to_string())),
        }
    }
}

/// API group named in the record. Informational only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiGroup {
    Core,
    Apps,
}

/// Readiness reported on the record.
///
/// `Ready` means the last completed pass left the observed count equal to
/// the desired count. Drift found later does not reset it; the next pass
/// that converges again simply leaves it `Ready`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Readiness {
    #[default]
    Initial,
    Ready,
}

impl Readiness {
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready)
    }
}

/// Reference to an object in the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectReference {
    pub kind: String,
    pub namespace: String,
    pub name: String,
}

/// Record metadata. `uid`, `resource_version` and `creation_timestamp` are
/// owned by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordMeta {
    pub namespace: String,
    pub name: String,
    #[serde(default)]
    pub uid: RecordUid,
    #[serde(default)]
    pub resource_version: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creation_timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RgbResourceSpec {
    /// Color label stamped on every item. Red when unset.
    #[serde(default)]
    pub color: Color,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<ApiGroup>,

    #[serde(default = "default_version")]
    pub version: String,

    /// Raw kind as written by the user; parsed with [`RgbResourceSpec::item_kind`].
    pub kind: String,

    /// Number of items to keep.
    pub count: u32,
}

fn default_version() -> String {
    "v1".to_string()
}

/// Bounds enforced when a record is admitted.
pub const MIN_COUNT: u32 = 2;
pub const MAX_COUNT: u32 = 5;

/// Reasons a record is refused at admission.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AdmissionError {
    #[error(transparent)]
    UnsupportedKind(#[from] UnsupportedKind),

    #[error("count {0} outside the allowed range 2..=5")]
    CountOutOfRange(u32),

    #[error("unsupported version '{0}': expected v1")]
    UnsupportedVersion(String),
}

impl RgbResourceSpec {
    pub fn new(kind: ItemKind, color: Color, count: u32) -> Self {
        Self {
            color,
            group: Some(kind.group()),
            version: default_version(),
            kind: kind.as_str().to_string(),
            count,
        }
    }

    /// Parse the raw kind.
    pub fn item_kind(&self) -> Result<ItemKind, UnsupportedKind> {
        self.kind.parse()
    }

    /// Checks applied before a record enters the store. The reconciler
    /// itself only re-checks the kind.
    pub fn validate(&self) -> Result<(), AdmissionError> {
        self.item_kind()?;
        if !(MIN_COUNT..=MAX_COUNT).contains(&self.count) {
            return Err(AdmissionError::CountOutOfRange(self.count));
        }
        if self.version != "v1" {
            return Err(AdmissionError::UnsupportedVersion(self.version.clone()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RgbResourceStatus {
    /// Managed items. Kept in the schema; the reconciler does not fill it.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub active: Vec<ObjectReference>,

    #[serde(default)]
    pub result: Readiness,
}

/// Desired-state record: keep `spec.count` items of `spec.kind`, colored
/// `spec.color`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RgbResource {
    pub metadata: RecordMeta,
    pub spec: RgbResourceSpec,
    #[serde(default)]
    pub status: RgbResourceStatus,
}

impl RgbResource {
    pub fn new(key: &ObjectKey, spec: RgbResourceSpec) -> Self {
        Self {
            metadata: RecordMeta {
                namespace: key.namespace.clone(),
                name: key.name.clone(),
                uid: RecordUid::new(),
                resource_version: 0,
                creation_timestamp: None,
            },
            spec,
            status: RgbResourceStatus::default(),
        }
    }

    pub fn key(&self) -> ObjectKey {
        ObjectKey {
            namespace: self.metadata.namespace.clone(),
            name: self.metadata.name.clone(),
        }
    }

    /// Controller owner reference for items created on this record's behalf.
    pub fn owner_reference(&self) -> OwnerReference {
        OwnerReference {
            api_version: API_VERSION.to_string(),
            kind: RESOURCE_KIND.to_string(),
            name: self.metadata.name.clone(),
            uid: self.metadata.uid,
            controller: true,
            block_owner_deletion: true,
        }
    }
}
