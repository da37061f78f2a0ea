//! Resource model shared by the reconciler and the store.
//!
//! - [`RgbResource`]: the desired-state record
//! - [`ManagedItem`]: a pod or deployment created on a record's behalf
//! - [`OwnershipLabels`] / [`OwnerSelector`]: how items are tied to records

mod item;
mod labels;
mod resource;

pub use item::{
    Container, ContainerPort, DeploymentSpec, ItemBody, ItemMeta, ManagedItem, OwnerReference,
    PodSpec, PodTemplate, Protocol,
};
pub use labels::{
    OwnerSelector, OwnershipLabels, APP_LABEL, COLOR_LABEL, DEFAULT_MANAGER_TAG, OWNER_LABEL,
};
pub use resource::{
    AdmissionError, ApiGroup, Color, ItemKind, ObjectReference, Readiness, RecordMeta,
    RgbResource, RgbResourceSpec, RgbResourceStatus, UnsupportedKind, API_VERSION, RESOURCE_KIND,
};
