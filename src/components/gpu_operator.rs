//! NVIDIA GPU Operator.
//!
//! Besides values, the GPU Operator bundle can carry the DCGM exporter
//! metrics ConfigMap. The chart only references that ConfigMap by name
//! (`dcgmExporter.config.name`); the bundle ships the object itself.

use super::{
    Component, ComponentDescriptor, ComponentMetadata, ManifestContext, ManifestProducer,
    MetadataProducer,
};
use crate::bundler::{Result, values::get_value_by_path};
use crate::metadata::{ConfigMap, keys, lookup};
use serde_json::json;
use serde_yaml::Value;
use std::{collections::BTreeMap, path::PathBuf};

pub(super) const DESCRIPTOR: ComponentDescriptor = ComponentDescriptor {
    name: "gpu-operator",
    display_name: "NVIDIA GPU Operator",
    override_keys: &["gpuoperator"],
    system_node_selector_paths: &[
        "operator.nodeSelector",
        "node-feature-discovery.gc.nodeSelector",
        "node-feature-discovery.master.nodeSelector",
    ],
    system_toleration_paths: &[
        "operator.tolerations",
        "node-feature-discovery.gc.tolerations",
        "node-feature-discovery.master.tolerations",
    ],
    accelerated_node_selector_paths: &[
        "daemonsets.nodeSelector",
        "node-feature-discovery.worker.nodeSelector",
    ],
    accelerated_toleration_paths: &[
        "daemonsets.tolerations",
        "node-feature-discovery.worker.tolerations",
    ],
    default_namespace: "gpu-operator",
    default_helm_repository: "https://helm.ngc.nvidia.com/nvidia",
    default_helm_chart: "nvidia/gpu-operator",
    default_helm_chart_version: "v25.3.0",
    templates,
};

/// Value path naming the DCGM exporter metrics ConfigMap.
const DCGM_CONFIG_NAME_PATH: &str = "dcgmExporter.config.name";

/// Metrics exported when the bundle ships the DCGM ConfigMap.
const DCGM_METRICS: &[(&str, &str, &str)] = &[
    ("DCGM_FI_DEV_SM_CLOCK", "gauge", "SM clock frequency (in MHz)."),
    ("DCGM_FI_DEV_MEM_CLOCK", "gauge", "Memory clock frequency (in MHz)."),
    ("DCGM_FI_DEV_GPU_TEMP", "gauge", "GPU temperature (in C)."),
    ("DCGM_FI_DEV_POWER_USAGE", "gauge", "Power draw (in W)."),
    ("DCGM_FI_DEV_GPU_UTIL", "gauge", "GPU utilization (in %)."),
    ("DCGM_FI_DEV_MEM_COPY_UTIL", "gauge", "Memory utilization (in %)."),
    ("DCGM_FI_DEV_FB_FREE", "gauge", "Framebuffer memory free (in MiB)."),
    ("DCGM_FI_DEV_FB_USED", "gauge", "Framebuffer memory used (in MiB)."),
    ("DCGM_FI_DEV_XID_ERRORS", "gauge", "Value of the last XID error encountered."),
    ("DCGM_FI_PROF_GR_ENGINE_ACTIVE", "gauge", "Ratio of time the graphics engine is active."),
];

fn templates(name: &str) -> Option<&'static str> {
    match name {
        "README.md" => Some(include_str!("templates/gpu-operator/README.md")),
        "dcgm-metrics.yaml" => Some(include_str!("templates/gpu-operator/dcgm-metrics.yaml")),
        _ => None,
    }
}

pub(super) struct GpuOperator;

impl Component for GpuOperator {
    fn descriptor(&self) -> &ComponentDescriptor {
        &DESCRIPTOR
    }

    fn manifests(&self) -> Option<&dyn ManifestProducer> {
        Some(self)
    }

    fn metadata(&self) -> Option<&dyn MetadataProducer> {
        Some(self)
    }
}

impl ManifestProducer for GpuOperator {
    fn produce_manifests(&self, ctx: &ManifestContext<'_>) -> Result<Vec<PathBuf>> {
        let Some(Value::String(config_name)) = get_value_by_path(ctx.values, DCGM_CONFIG_NAME_PATH)
        else {
            log::debug!("{DCGM_CONFIG_NAME_PATH} not set, skipping DCGM metrics ConfigMap");
            return Ok(Vec::new());
        };

        let metrics: String = DCGM_METRICS
            .iter()
            .map(|(field, kind, help)| format!("    {field}, {kind}, {help}\n"))
            .collect();

        let metadata = json!({
            "name": config_name,
            "namespace": lookup(ctx.config, DESCRIPTOR.name, keys::NAMESPACE, DESCRIPTOR.default_namespace),
            "metrics": metrics.trim_end(),
        });

        let content = ctx.render("dcgm-metrics.yaml", &metadata)?;
        Ok(vec![ctx.write_manifest("dcgm-metrics.yaml", &content)?])
    }
}

impl MetadataProducer for GpuOperator {
    fn produce_metadata(&self, config: &ConfigMap) -> Result<ComponentMetadata> {
        let mut extensions = BTreeMap::new();
        extensions.insert(
            "accelerator".to_string(),
            lookup(config, DESCRIPTOR.name, keys::ACCELERATOR, "any").to_string(),
        );
        Ok(ComponentMetadata::Extensions(extensions))
    }
}
