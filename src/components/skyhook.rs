//! Skyhook node customization operator.
//!
//! The `customization` value selects a node tuning profile. When set, the
//! bundle includes a `Skyhook` custom resource scheduled onto the
//! accelerated tier.

use super::{
    Component, ComponentDescriptor, ComponentMetadata, ManifestContext, ManifestProducer,
    MetadataProducer,
};
use crate::bundler::{
    Error, Result,
    values::{get_value_by_path, node_selector_to_match_expressions},
};
use crate::metadata::{ConfigMap, keys, lookup};
use serde_json::json;
use serde_yaml::Value;
use std::{collections::BTreeMap, path::PathBuf};

pub(super) const DESCRIPTOR: ComponentDescriptor = ComponentDescriptor {
    name: "skyhook-operator",
    display_name: "Skyhook Operator",
    override_keys: &["skyhook"],
    system_node_selector_paths: &["controllerManager.nodeSelector"],
    system_toleration_paths: &["controllerManager.tolerations"],
    accelerated_node_selector_paths: &[],
    accelerated_toleration_paths: &[],
    default_namespace: "skyhook",
    default_helm_repository: "https://helm.ngc.nvidia.com/nvidia/skyhook",
    default_helm_chart: "skyhook/skyhook-operator",
    default_helm_chart_version: "v0.8.0",
    templates,
};

/// Value path selecting the customization profile.
const CUSTOMIZATION_PATH: &str = "customization";

/// Profiles with a bundled custom resource: `(name, package, version)`.
const CUSTOMIZATIONS: &[(&str, &str, &str)] = &[("tuning", "tuning", "0.1.3")];

fn templates(name: &str) -> Option<&'static str> {
    match name {
        "README.md" => Some(include_str!("templates/skyhook-operator/README.md")),
        "skyhook.yaml" => Some(include_str!("templates/skyhook-operator/skyhook.yaml")),
        _ => None,
    }
}

pub(super) struct Skyhook;

impl Component for Skyhook {
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

impl ManifestProducer for Skyhook {
    fn produce_manifests(&self, ctx: &ManifestContext<'_>) -> Result<Vec<PathBuf>> {
        let customization = match get_value_by_path(ctx.values, CUSTOMIZATION_PATH) {
            None | Some(Value::Null) => {
                log::debug!("no {CUSTOMIZATION_PATH} set, skipping Skyhook resource");
                return Ok(Vec::new());
            }
            Some(Value::String(name)) => name.as_str(),
            Some(other) => {
                return Err(Error::InvalidRequest(format!(
                    "{CUSTOMIZATION_PATH} must be a string, got {other:?}"
                )));
            }
        };

        let (_, package, version) = CUSTOMIZATIONS
            .iter()
            .find(|(name, _, _)| *name == customization)
            .ok_or_else(|| {
                let known: Vec<_> = CUSTOMIZATIONS.iter().map(|(name, _, _)| *name).collect();
                Error::InvalidRequest(format!(
                    "unknown skyhook customization `{customization}` (known: {})",
                    known.join(", ")
                ))
            })?;

        let placement = ctx.settings.accelerated_placement();
        if placement.node_selector.is_empty() {
            log::warn!(
                "skyhook customization `{customization}` has no accelerated node selector and will target every node"
            );
        }

        let metadata = json!({
            "name": customization,
            "namespace": lookup(ctx.config, DESCRIPTOR.name, keys::NAMESPACE, DESCRIPTOR.default_namespace),
            "package": package,
            "package_version": version,
            "node_selectors": node_selector_to_match_expressions(&placement.node_selector),
            "tolerations": placement.tolerations,
        });

        let content = ctx.render("skyhook.yaml", &metadata)?;
        Ok(vec![ctx.write_manifest("skyhook.yaml", &content)?])
    }
}

impl MetadataProducer for Skyhook {
    fn produce_metadata(&self, config: &ConfigMap) -> Result<ComponentMetadata> {
        let mut extensions = BTreeMap::new();
        extensions.insert(
            "customizations".to_string(),
            CUSTOMIZATIONS
                .iter()
                .map(|(name, _, _)| *name)
                .collect::<Vec<_>>()
                .join(", "),
        );
        extensions.insert(
            "accelerator".to_string(),
            lookup(config, DESCRIPTOR.name, keys::ACCELERATOR, "any").to_string(),
        );
        Ok(ComponentMetadata::Extensions(extensions))
    }
}
