//! Component descriptors, extension capabilities, and the registry.
//!
//! A component is a static [`ComponentDescriptor`] plus two optional
//! capabilities: a [`ManifestProducer`] that writes extra manifests into the
//! bundle, and a [`MetadataProducer`] that extends or replaces the metadata
//! record templates receive. The generic pipeline in
//! [`crate::bundler::Bundler`] never changes per component.

mod cert_manager;
mod gpu_operator;
mod network_operator;
mod nvsentinel;
mod registry;
mod skyhook;

pub use registry::{ComponentRegistry, RegistryBuilder};

use crate::bundler::{
    Result, Settings,
    error::Error,
    template::TemplateRenderer,
    utils::fs,
    values::ValueTree,
};
use crate::metadata::ConfigMap;
use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};
use tokio_util::sync::CancellationToken;

/// Subdirectory of a bundle holding component-specific manifests.
pub const MANIFESTS_DIR: &str = "manifests";

/// Resolves a template name to its text.
pub type TemplateResolver = fn(&str) -> Option<&'static str>;

/// Static description of a component, driving the generic pipeline.
///
/// Descriptors are `const` items owned by each component module and are
/// never mutated.
#[derive(Debug, Clone, Copy)]
pub struct ComponentDescriptor {
    /// Identifier used in recipes and on the command line.
    pub name: &'static str,

    /// Human-readable name for headers and documentation.
    pub display_name: &'static str,

    /// Alternate keys for override lookup, tried after `name`.
    pub override_keys: &'static [&'static str],

    /// Value paths that receive the system-tier node selector.
    pub system_node_selector_paths: &'static [&'static str],

    /// Value paths that receive the system-tier tolerations.
    pub system_toleration_paths: &'static [&'static str],

    /// Value paths that receive the accelerated-tier node selector.
    pub accelerated_node_selector_paths: &'static [&'static str],

    /// Value paths that receive the accelerated-tier tolerations.
    pub accelerated_toleration_paths: &'static [&'static str],

    pub default_namespace: &'static str,
    pub default_helm_repository: &'static str,
    pub default_helm_chart: &'static str,
    pub default_helm_chart_version: &'static str,

    /// Template lookup for this component.
    pub templates: TemplateResolver,
}

/// A bundleable component.
pub trait Component: Send + Sync {
    /// Returns the static descriptor.
    fn descriptor(&self) -> &ComponentDescriptor;

    /// Returns the manifest capability, if the component writes manifests.
    fn manifests(&self) -> Option<&dyn ManifestProducer> {
        None
    }

    /// Returns the metadata capability, if the component customizes metadata.
    fn metadata(&self) -> Option<&dyn MetadataProducer> {
        None
    }
}

/// Writes component-specific manifests into `manifests/`.
pub trait ManifestProducer: Send + Sync {
    /// Produces manifests and returns the paths written.
    ///
    /// Any error fails the whole bundle.
    fn produce_manifests(&self, ctx: &ManifestContext<'_>) -> Result<Vec<PathBuf>>;
}

/// What a [`MetadataProducer`] contributes.
#[derive(Debug, Clone, PartialEq)]
pub enum ComponentMetadata {
    /// Keys merged into the default record's `extensions`.
    Extensions(BTreeMap<String, String>),

    /// A record that replaces the default one.
    Custom(serde_json::Value),
}

/// Customizes the metadata record passed to templates.
pub trait MetadataProducer: Send + Sync {
    fn produce_metadata(&self, config: &ConfigMap) -> Result<ComponentMetadata>;
}

/// Inputs available to a [`ManifestProducer`].
pub struct ManifestContext<'a> {
    pub descriptor: &'a ComponentDescriptor,

    /// Root of the bundle being assembled.
    pub bundle_dir: &'a Path,

    /// Values after overrides and placement were applied.
    pub values: &'a ValueTree,

    /// Flat metadata configuration for this build.
    pub config: &'a ConfigMap,

    pub settings: &'a Settings,
    pub renderer: &'a TemplateRenderer,
    pub cancel: &'a CancellationToken,
}

impl ManifestContext<'_> {
    /// Fails with a cancellation error if the build was cancelled.
    pub fn check_cancelled(&self) -> Result<()> {
        if self.cancel.is_cancelled() {
            return Err(Error::Cancelled(format!(
                "{} manifest generation",
                self.descriptor.name
            )));
        }
        Ok(())
    }

    /// Renders one of the component's templates against the merged values.
    pub fn render(&self, template: &str, metadata: &serde_json::Value) -> Result<String> {
        self.renderer
            .render(self.descriptor, template, self.values, metadata)
    }

    /// Writes `content` to `manifests/<file_name>` and returns its path.
    pub fn write_manifest(&self, file_name: &str, content: &str) -> Result<PathBuf> {
        self.check_cancelled()?;

        let path = self.bundle_dir.join(MANIFESTS_DIR).join(file_name);
        fs::write_file(&path, content)?;
        log::debug!("Wrote manifest {}", path.display());
        Ok(path)
    }
}
