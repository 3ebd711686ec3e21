//! NVIDIA Network Operator.

use super::{Component, ComponentDescriptor, ComponentMetadata, MetadataProducer};
use crate::bundler::Result;
use crate::metadata::{ConfigMap, keys, lookup};
use std::collections::BTreeMap;

pub(super) const DESCRIPTOR: ComponentDescriptor = ComponentDescriptor {
    name: "network-operator",
    display_name: "NVIDIA Network Operator",
    override_keys: &["networkoperator"],
    system_node_selector_paths: &[
        "operator.nodeSelector",
        "node-feature-discovery.master.nodeSelector",
        "node-feature-discovery.gc.nodeSelector",
    ],
    system_toleration_paths: &[
        "operator.tolerations",
        "node-feature-discovery.master.tolerations",
        "node-feature-discovery.gc.tolerations",
    ],
    accelerated_node_selector_paths: &["node-feature-discovery.worker.nodeSelector"],
    accelerated_toleration_paths: &["node-feature-discovery.worker.tolerations"],
    default_namespace: "nvidia-network-operator",
    default_helm_repository: "https://helm.ngc.nvidia.com/nvidia",
    default_helm_chart: "nvidia/network-operator",
    default_helm_chart_version: "v25.4.0",
    templates,
};

fn templates(name: &str) -> Option<&'static str> {
    match name {
        "README.md" => Some(include_str!("templates/network-operator/README.md")),
        _ => None,
    }
}

pub(super) struct NetworkOperator;

impl Component for NetworkOperator {
    fn descriptor(&self) -> &ComponentDescriptor {
        &DESCRIPTOR
    }

    fn metadata(&self) -> Option<&dyn MetadataProducer> {
        Some(self)
    }
}

impl MetadataProducer for NetworkOperator {
    /// Adds the policy resource operators apply after install and the
    /// accelerator the recipe targets.
    fn produce_metadata(&self, config: &ConfigMap) -> Result<ComponentMetadata> {
        let mut extensions = BTreeMap::new();
        extensions.insert("policy_kind".to_string(), "NicClusterPolicy".to_string());
        extensions.insert(
            "accelerator".to_string(),
            lookup(config, DESCRIPTOR.name, keys::ACCELERATOR, "any").to_string(),
        );
        Ok(ComponentMetadata::Extensions(extensions))
    }
}
