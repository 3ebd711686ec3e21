//! Core Settings struct and implementations.

use crate::bundler::values::{NodeSelector, OverrideSet, Toleration};
use crate::components::ComponentDescriptor;
use std::collections::BTreeMap;

/// Placement policy for one node tier.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Placement {
    /// Labels the tier's workloads must land on.
    pub node_selector: NodeSelector,

    /// Taints the tier's workloads tolerate.
    pub tolerations: Vec<Toleration>,
}

impl Placement {
    /// Returns true when neither a selector nor tolerations are set.
    pub fn is_empty(&self) -> bool {
        self.node_selector.is_empty() && self.tolerations.is_empty()
    }
}

/// Read-only configuration shared by every bundle build.
///
/// Constructed via [`SettingsBuilder`](super::SettingsBuilder) and never
/// mutated afterwards, so one instance can be shared by concurrent builds.
///
/// # Examples
///
/// ```no_run
/// use kodegen_bundler_helm::bundler::SettingsBuilder;
///
/// # fn example() -> kodegen_bundler_helm::bundler::Result<()> {
/// let settings = SettingsBuilder::new()
///     .value_override("gpu-operator", "driver.version", "570.86.15")
///     .include_checksums(false)
///     .build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct Settings {
    /// Version string written into bundle headers and metadata.
    bundler_version: String,

    /// Render `README.md` into each bundle.
    include_readme: bool,

    /// Write `checksums.txt` into each bundle.
    include_checksums: bool,

    /// Emit detailed progress output.
    verbose: bool,

    /// Overrides keyed by component name or alternate override key.
    value_overrides: BTreeMap<String, OverrideSet>,

    /// Placement for control-plane style workloads (operators, webhooks).
    system: Placement,

    /// Placement for workloads that must run on accelerated nodes.
    accelerated: Placement,
}

impl Settings {
    pub(super) fn new(
        bundler_version: String,
        include_readme: bool,
        include_checksums: bool,
        verbose: bool,
        value_overrides: BTreeMap<String, OverrideSet>,
        system: Placement,
        accelerated: Placement,
    ) -> Self {
        Self {
            bundler_version,
            include_readme,
            include_checksums,
            verbose,
            value_overrides,
            system,
            accelerated,
        }
    }

    /// Returns the bundler version string.
    pub fn bundler_version(&self) -> &str {
        &self.bundler_version
    }

    /// Returns whether documentation is generated.
    pub fn include_readme(&self) -> bool {
        self.include_readme
    }

    /// Returns whether checksum manifests are generated.
    pub fn include_checksums(&self) -> bool {
        self.include_checksums
    }

    /// Returns whether verbose output was requested.
    pub fn verbose(&self) -> bool {
        self.verbose
    }

    /// Returns the override set for a component.
    ///
    /// Looks up the component's name first, then each of its alternate
    /// override keys in declaration order.
    pub fn overrides_for(&self, descriptor: &ComponentDescriptor) -> Option<&OverrideSet> {
        std::iter::once(descriptor.name)
            .chain(descriptor.override_keys.iter().copied())
            .find_map(|key| self.value_overrides.get(key))
    }

    /// Returns all configured overrides keyed by lookup key.
    pub fn value_overrides(&self) -> &BTreeMap<String, OverrideSet> {
        &self.value_overrides
    }

    /// Returns the system-tier placement policy.
    pub fn system_placement(&self) -> &Placement {
        &self.system
    }

    /// Returns the accelerated-tier placement policy.
    pub fn accelerated_placement(&self) -> &Placement {
        &self.accelerated
    }
}
