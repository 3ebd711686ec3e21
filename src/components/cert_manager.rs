//! cert-manager.

use super::{Component, ComponentDescriptor};

pub(super) const DESCRIPTOR: ComponentDescriptor = ComponentDescriptor {
    name: "cert-manager",
    display_name: "cert-manager",
    override_keys: &["certmanager"],
    system_node_selector_paths: &[
        "nodeSelector",
        "webhook.nodeSelector",
        "cainjector.nodeSelector",
        "startupapicheck.nodeSelector",
    ],
    system_toleration_paths: &[
        "tolerations",
        "webhook.tolerations",
        "cainjector.tolerations",
        "startupapicheck.tolerations",
    ],
    accelerated_node_selector_paths: &[],
    accelerated_toleration_paths: &[],
    default_namespace: "cert-manager",
    default_helm_repository: "https://charts.jetstack.io",
    default_helm_chart: "jetstack/cert-manager",
    default_helm_chart_version: "v1.17.2",
    templates,
};

fn templates(name: &str) -> Option<&'static str> {
    match name {
        "README.md" => Some(include_str!("templates/cert-manager/README.md")),
        _ => None,
    }
}

/// cert-manager has no custom manifests or metadata.
pub(super) struct CertManager;

impl Component for CertManager {
    fn descriptor(&self) -> &ComponentDescriptor {
        &DESCRIPTOR
    }
}
