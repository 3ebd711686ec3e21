//! NVSentinel GPU health monitoring.
//!
//! NVSentinel documents its health monitors rather than chart coordinates
//! alone, so it replaces the default metadata record entirely.

use super::{Component, ComponentDescriptor, ComponentMetadata, MetadataProducer};
use crate::bundler::Result;
use crate::metadata::{ConfigMap, keys, lookup};
use serde_json::json;

pub(super) const DESCRIPTOR: ComponentDescriptor = ComponentDescriptor {
    name: "nvsentinel",
    display_name: "NVSentinel",
    override_keys: &[],
    system_node_selector_paths: &["platformConnector.nodeSelector", "faultQuarantine.nodeSelector"],
    system_toleration_paths: &["platformConnector.tolerations", "faultQuarantine.tolerations"],
    accelerated_node_selector_paths: &["gpuHealthMonitor.nodeSelector"],
    accelerated_toleration_paths: &["gpuHealthMonitor.tolerations"],
    default_namespace: "nvsentinel",
    default_helm_repository: "oci://ghcr.io/nvidia",
    default_helm_chart: "nvidia/nvsentinel",
    default_helm_chart_version: "v0.3.0",
    templates,
};

const MONITORS: &[(&str, &str)] = &[
    ("gpu-health-monitor", "DCGM health checks on every GPU node"),
    ("syslog-health-monitor", "Kernel XID and SXID errors from the journal"),
    ("fault-quarantine", "Cordons nodes that report fatal faults"),
];

fn templates(name: &str) -> Option<&'static str> {
    match name {
        "README.md" => Some(include_str!("templates/nvsentinel/README.md")),
        _ => None,
    }
}

pub(super) struct NvSentinel;

impl Component for NvSentinel {
    fn descriptor(&self) -> &ComponentDescriptor {
        &DESCRIPTOR
    }

    fn metadata(&self) -> Option<&dyn MetadataProducer> {
        Some(self)
    }
}

impl MetadataProducer for NvSentinel {
    fn produce_metadata(&self, config: &ConfigMap) -> Result<ComponentMetadata> {
        let get = |key: &str, default: &'static str| lookup(config, DESCRIPTOR.name, key, default);

        let monitors: Vec<_> = MONITORS
            .iter()
            .map(|(name, description)| json!({"name": name, "description": description}))
            .collect();

        Ok(ComponentMetadata::Custom(json!({
            "namespace": get(keys::NAMESPACE, DESCRIPTOR.default_namespace),
            "chart": {
                "repository": get(keys::HELM_REPOSITORY, DESCRIPTOR.default_helm_repository),
                "name": get(keys::HELM_CHART, DESCRIPTOR.default_helm_chart),
                "version": get(keys::HELM_CHART_VERSION, DESCRIPTOR.default_helm_chart_version),
            },
            "versions": {
                "bundler": get(keys::BUNDLER_VERSION, "dev"),
                "recipe": get(keys::RECIPE_VERSION, "unknown"),
            },
            "monitors": monitors,
        })))
    }
}
