//! Items the controller creates and deletes.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rgb_id::RecordUid;
use serde::{Deserialize, Serialize};

use super::resource::ItemKind;

/// Back-reference from an item to the record that owns it. The store's
/// garbage collector uses it to cascade record deletion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerReference {
    pub api_version: String,
    pub kind: String,
    pub name: String,
    pub uid: RecordUid,
    pub controller: bool,
    pub block_owner_deletion: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemMeta {
    pub name: String,
    pub namespace: String,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub owner_references: Vec<OwnerReference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creation_timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Protocol {
    #[serde(rename = "TCP")]
    Tcp,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerPort {
    pub name: String,
    pub protocol: Protocol,
    pub container_port: u16,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Container {
    pub name: String,
    pub image: String,
    #[serde(default)]
    pub ports: Vec<ContainerPort>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PodSpec {
    pub containers: Vec<Container>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PodTemplate {
    pub labels: BTreeMap<String, String>,
    pub spec: PodSpec,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentSpec {
    pub replicas: u32,
    /// Labels the deployment selects its pods by; a subset of the template labels.
    pub selector: BTreeMap<String, String>,
    pub template: PodTemplate,
}

/// Kind-specific payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "spec")]
pub enum ItemBody {
    Pod(PodSpec),
    Deployment(DeploymentSpec),
}

/// A pod or deployment as held by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagedItem {
    pub metadata: ItemMeta,
    pub body: ItemBody,
}

impl ManagedItem {
    pub fn kind(&self) -> ItemKind {
        match self.body {
            ItemBody::Pod(_) => ItemKind::Pod,
            ItemBody::Deployment(_) => ItemKind::Deployment,
        }
    }

    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    pub fn namespace(&self) -> &str {
        &self.metadata.namespace
    }

    pub fn label(&self, key: &str) -> Option<&str> {
        self.metadata.labels.get(key).map(String::as_str)
    }

    /// UID of the controlling owner, if any.
    pub fn controller_uid(&self) -> Option<RecordUid> {
        self.metadata
            .owner_references
            .iter()
            .find(|r| r.controller)
            .map(|r| r.uid)
    }

    /// Containers of the pod, or of the deployment's pod template.
    pub fn containers(&self) -> &[Container] {
        match &self.body {
            ItemBody::Pod(spec) => &spec.containers,
            ItemBody::Deployment(spec) => &spec.template.spec.containers,
        }
    }
}
