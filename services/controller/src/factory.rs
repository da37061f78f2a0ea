//! Builds new managed items.
//!
//! Pods and deployments share one container template; a deployment wraps it
//! in a pod template with a single replica and a selector over the
//! ownership labels.

use std::collections::BTreeMap;

use rgb_id::item_name;

use crate::api::{
    Container, ContainerPort, DeploymentSpec, ItemBody, ItemKind, ItemMeta, ManagedItem,
    OwnerReference, OwnershipLabels, PodSpec, PodTemplate, Protocol,
};

/// Container settings shared by every item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemTemplate {
    pub image: String,
    pub port_name: String,
    pub port: u16,

    /// Extra labels put on every item. Ownership and color labels win on
    /// conflict.
    pub labels: BTreeMap<String, String>,
}

impl Default for ItemTemplate {
    fn default() -> Self {
        Self {
            image: "nginx".to_string(),
            port_name: "http".to_string(),
            port: 80,
            labels: BTreeMap::new(),
        }
    }
}

/// Stateless item builder.
#[derive(Debug, Clone, Default)]
pub struct ItemFactory {
    template: ItemTemplate,
}

impl ItemFactory {
    pub fn new(template: ItemTemplate) -> Self {
        Self { template }
    }

    /// Build an item of `kind` owned by `owner`, named `<owner>-<uuid>`.
    pub fn build(
        &self,
        kind: ItemKind,
        namespace: &str,
        labels: &OwnershipLabels,
        owner: OwnerReference,
    ) -> ManagedItem {
        let name = item_name(&owner.name);

        let mut item_labels = self.template.labels.clone();
        item_labels.extend(labels.to_labels());

        let body = match kind {
            ItemKind::Pod => ItemBody::Pod(self.pod_spec(&name)),
            ItemKind::Deployment => ItemBody::Deployment(DeploymentSpec {
                replicas: 1,
                selector: labels.selector().to_labels(),
                template: PodTemplate {
                    labels: item_labels.clone(),
                    spec: self.pod_spec(&name),
                },
            }),
        };

        ManagedItem {
            metadata: ItemMeta {
                name,
                namespace: namespace.to_string(),
                labels: item_labels,
                owner_references: vec![owner],
                creation_timestamp: None,
            },
            body,
        }
    }

    fn pod_spec(&self, name: &str) -> PodSpec {
        PodSpec {
            containers: vec![Container {
                name: name.to_string(),
                image: self.template.image.clone(),
                ports: vec![ContainerPort {
                    name: self.template.port_name.clone(),
                    protocol: Protocol::Tcp,
                    container_port: self.template.port,
                }],
            }],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{
        Color, OwnerSelector, RgbResource, RgbResourceSpec, COLOR_LABEL, DEFAULT_MANAGER_TAG,
    };
    use rgb_id::ObjectKey;

    fn record(kind: ItemKind, color: Color) -> RgbResource {
        let key = ObjectKey::new("team-a", "rgb-sample").unwrap();
        RgbResource::new(&key, RgbResourceSpec::new(kind, color, 3))
    }

    fn labels_for(record: &RgbResource) -> OwnershipLabels {
        OwnershipLabels::new(
            OwnerSelector::for_record(DEFAULT_MANAGER_TAG, record),
            record.spec.color,
        )
    }

    #[test]
    fn test_build_pod() {
        let record = record(ItemKind::Pod, Color::Green);
        let labels = labels_for(&record);
        let item = ItemFactory::default().build(
            ItemKind::Pod,
            "team-a",
            &labels,
            record.owner_reference(),
        );

        assert_eq!(item.kind(), ItemKind::Pod);
        assert!(item.name().starts_with("rgb-sample-"));
        assert_eq!(item.namespace(), "team-a");
        assert!(labels.selector().matches(&item.metadata.labels));
        assert_eq!(item.label(COLOR_LABEL), Some("Green"));
        assert_eq!(item.controller_uid(), Some(record.metadata.uid));

        let containers = item.containers();
        assert_eq!(containers.len(), 1);
        assert_eq!(containers[0].name, item.name());
        assert_eq!(containers[0].image, "nginx");
        assert_eq!(containers[0].ports[0].container_port, 80);
        assert_eq!(containers[0].ports[0].name, "http");
        assert_eq!(containers[0].ports[0].protocol, Protocol::Tcp);
    }

    #[test]
    fn test_build_deployment_wraps_pod_template() {
        let record = record(ItemKind::Deployment, Color::Blue);
        let labels = labels_for(&record);
        let item = ItemFactory::default().build(
            ItemKind::Deployment,
            "team-a",
            &labels,
            record.owner_reference(),
        );

        let ItemBody::Deployment(spec) = &item.body else {
            panic!("expected a deployment, got {:?}", item.body);
        };
        assert_eq!(spec.replicas, 1);
        assert_eq!(spec.template.labels, item.metadata.labels);
        assert!(spec
            .selector
            .iter()
            .all(|(k, v)| spec.template.labels.get(k) == Some(v)));
        assert_eq!(spec.template.spec.containers[0].image, "nginx");
    }

    #[test]
    fn test_record_color_overrides_template_label() {
        let template = ItemTemplate {
            image: "registry.local/nginx:1.25".to_string(),
            labels: BTreeMap::from([
                (COLOR_LABEL.to_string(), "Red".to_string()),
                ("tier".to_string(), "web".to_string()),
            ]),
            ..ItemTemplate::default()
        };
        let record = record(ItemKind::Pod, Color::Blue);
        let labels = labels_for(&record);
        let item = ItemFactory::new(template).build(
            ItemKind::Pod,
            "team-a",
            &labels,
            record.owner_reference(),
        );

        assert_eq!(item.label(COLOR_LABEL), Some("Blue"));
        assert_eq!(item.label("tier"), Some("web"));
        assert_eq!(item.containers()[0].image, "registry.local/nginx:1.25");
    }

    #[test]
    fn test_names_do_not_collide() {
        let record = record(ItemKind::Pod, Color::Red);
        let labels = labels_for(&record);
        let factory = ItemFactory::default();
        let names: std::collections::BTreeSet<_> = (0..16)
            .map(|_| {
                factory
                    .build(ItemKind::Pod, "team-a", &labels, record.owner_reference())
                    .metadata
                    .name
            })
            .collect();
        assert_eq!(names.len(), 16);
    }
}
