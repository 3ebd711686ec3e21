//! Bundle metadata generation.
//!
//! The orchestrator builds a flat [`ConfigMap`] per component (namespace,
//! chart coordinates, versions, accelerator). This module turns it into the
//! record templates see under `metadata`: either the default
//! [`BundleMetadata`], the default extended with component-specific keys, or
//! a record produced entirely by the component.

use crate::bundler::Result;
use crate::components::{Component, ComponentMetadata};
use serde::Serialize;
use std::collections::BTreeMap;

/// Flat metadata configuration handed to metadata and manifest producers.
pub type ConfigMap = BTreeMap<String, String>;

/// Well-known [`ConfigMap`] keys.
pub mod keys {
    pub const NAMESPACE: &str = "namespace";
    pub const HELM_REPOSITORY: &str = "helm_repository";
    pub const HELM_CHART: &str = "helm_chart";
    pub const HELM_CHART_VERSION: &str = "helm_chart_version";
    pub const ACCELERATOR: &str = "accelerator";
    pub const BUNDLER_VERSION: &str = "bundler_version";
    pub const RECIPE_VERSION: &str = "recipe_version";
}

/// Looks up `key` scoped to `component`, falling back to the unscoped key
/// and finally to `default`.
///
/// A scoped key is written `<component>.<key>`, e.g. `gpu-operator.namespace`.
pub fn lookup<'a>(config: &'a ConfigMap, component: &str, key: &str, default: &'a str) -> &'a str {
    let non_empty = move |k: &str| config.get(k).map(String::as_str).filter(|v| !v.is_empty());
    non_empty(&format!("{component}.{key}"))
        .or_else(|| non_empty(key))
        .unwrap_or(default)
}

/// Default metadata record exposed to templates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BundleMetadata {
    pub namespace: String,
    pub helm_repository: String,
    pub helm_chart: String,
    pub helm_chart_version: String,
    pub bundler_version: String,
    pub recipe_version: String,

    /// Component-contributed keys. Always present so templates can iterate it.
    pub extensions: BTreeMap<String, String>,
}

impl BundleMetadata {
    /// Builds the default record, using `component`'s descriptor defaults
    /// for anything the config map does not provide.
    pub fn from_config(config: &ConfigMap, component: &dyn Component) -> Self {
        let d = component.descriptor();
        Self {
            namespace: lookup(config, d.name, keys::NAMESPACE, d.default_namespace).to_string(),
            helm_repository: lookup(config, d.name, keys::HELM_REPOSITORY, d.default_helm_repository)
                .to_string(),
            helm_chart: lookup(config, d.name, keys::HELM_CHART, d.default_helm_chart).to_string(),
            helm_chart_version: lookup(
                config,
                d.name,
                keys::HELM_CHART_VERSION,
                d.default_helm_chart_version,
            )
            .to_string(),
            bundler_version: lookup(config, d.name, keys::BUNDLER_VERSION, "dev").to_string(),
            recipe_version: lookup(config, d.name, keys::RECIPE_VERSION, "unknown").to_string(),
            extensions: BTreeMap::new(),
        }
    }
}

/// Produces the metadata value rendered under the `metadata` template key.
///
/// Components without a metadata producer get the default record.
pub fn generate(config: &ConfigMap, component: &dyn Component) -> Result<serde_json::Value> {
    let mut metadata = BundleMetadata::from_config(config, component);

    match component.metadata() {
        None => Ok(serde_json::to_value(metadata)?),
        Some(producer) => match producer.produce_metadata(config)? {
            ComponentMetadata::Extensions(extensions) => {
                log::debug!(
                    "Extending {} metadata with {} key(s)",
                    component.descriptor().name,
                    extensions.len()
                );
                metadata.extensions.extend(extensions);
                Ok(serde_json::to_value(metadata)?)
            }
            ComponentMetadata::Custom(value) => Ok(value),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{ComponentDescriptor, MetadataProducer};
    use serde_json::json;

    const DESCRIPTOR: ComponentDescriptor = ComponentDescriptor {
        name: "demo",
        display_name: "Demo",
        override_keys: &[],
        system_node_selector_paths: &[],
        system_toleration_paths: &[],
        accelerated_node_selector_paths: &[],
        accelerated_toleration_paths: &[],
        default_namespace: "demo-system",
        default_helm_repository: "https://charts.example.com",
        default_helm_chart: "example/demo",
        default_helm_chart_version: "v1.0.0",
        templates: no_templates,
    };

    fn no_templates(_: &str) -> Option<&'static str> {
        None
    }

    struct Plain;

    impl Component for Plain {
        fn descriptor(&self) -> &ComponentDescriptor {
            &DESCRIPTOR
        }
    }

    struct Extended;

    impl Component for Extended {
        fn descriptor(&self) -> &ComponentDescriptor {
            &DESCRIPTOR
        }

        fn metadata(&self) -> Option<&dyn MetadataProducer> {
            Some(self)
        }
    }

    impl MetadataProducer for Extended {
        fn produce_metadata(&self, config: &ConfigMap) -> Result<ComponentMetadata> {
            let mut ext = BTreeMap::new();
            ext.insert(
                "accelerator".to_string(),
                lookup(config, "demo", keys::ACCELERATOR, "any").to_string(),
            );
            Ok(ComponentMetadata::Extensions(ext))
        }
    }

    struct Custom;

    impl Component for Custom {
        fn descriptor(&self) -> &ComponentDescriptor {
            &DESCRIPTOR
        }

        fn metadata(&self) -> Option<&dyn MetadataProducer> {
            Some(self)
        }
    }

    impl MetadataProducer for Custom {
        fn produce_metadata(&self, config: &ConfigMap) -> Result<ComponentMetadata> {
            Ok(ComponentMetadata::Custom(json!({
                "monitors": ["gpu", "syslog"],
                "namespace": lookup(config, "demo", keys::NAMESPACE, "fallback"),
            })))
        }
    }

    fn config(pairs: &[(&str, &str)]) -> ConfigMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn defaults_fill_missing_fields() {
        let metadata = BundleMetadata::from_config(
            &config(&[(keys::HELM_CHART_VERSION, "v1.2.0"), (keys::BUNDLER_VERSION, "0.3.0")]),
            &Plain,
        );
        assert_eq!(
            metadata,
            BundleMetadata {
                namespace: "demo-system".into(),
                helm_repository: "https://charts.example.com".into(),
                helm_chart: "example/demo".into(),
                helm_chart_version: "v1.2.0".into(),
                bundler_version: "0.3.0".into(),
                recipe_version: "unknown".into(),
                extensions: BTreeMap::new(),
            }
        );
    }

    #[test]
    fn scoped_keys_win() {
        let cfg = config(&[("namespace", "shared"), ("demo.namespace", "scoped")]);
        assert_eq!(lookup(&cfg, "demo", "namespace", "default"), "scoped");
        assert_eq!(lookup(&cfg, "other", "namespace", "default"), "shared");
        assert_eq!(lookup(&cfg, "other", "missing", "default"), "default");
    }

    #[test]
    fn empty_values_use_default() {
        let cfg = config(&[("namespace", "")]);
        assert_eq!(lookup(&cfg, "demo", "namespace", "default"), "default");
    }

    #[test]
    fn empty_scoped_value_falls_back_to_shared_key() {
        let cfg = config(&[("namespace", "shared"), ("demo.namespace", "")]);
        assert_eq!(lookup(&cfg, "demo", "namespace", "default"), "shared");
    }

    #[test]
    fn extensions_merge_into_default_record() {
        let value = generate(&config(&[(keys::ACCELERATOR, "h100")]), &Extended).unwrap();
        assert_eq!(value["namespace"], "demo-system");
        assert_eq!(value["extensions"]["accelerator"], "h100");
    }

    #[test]
    fn custom_record_replaces_default() {
        let value = generate(&config(&[(keys::NAMESPACE, "sentinel")]), &Custom).unwrap();
        assert_eq!(
            value,
            json!({"monitors": ["gpu", "syslog"], "namespace": "sentinel"})
        );
    }

    #[test]
    fn plain_component_gets_empty_extensions() {
        let value = generate(&ConfigMap::new(), &Plain).unwrap();
        assert_eq!(value["extensions"], json!({}));
    }
}
