//! Builder for constructing Settings.

use super::{Placement, Settings, SettingsFile};
use crate::bundler::{
    error::{Context, Error, Result},
    values::{OverrideSet, Toleration},
};
use std::collections::BTreeMap;

/// Builder for constructing [`Settings`].
///
/// Values set later win, so a configuration file can be applied first with
/// [`SettingsBuilder::file`] and command line flags layered on top.
///
/// # Examples
///
/// ```no_run
/// use kodegen_bundler_helm::bundler::{SettingsBuilder, Toleration};
///
/// # fn example() -> kodegen_bundler_helm::bundler::Result<()> {
/// let settings = SettingsBuilder::new()
///     .system_node_selector("nodeGroup", "system")
///     .accelerated_node_toleration("nvidia.com/gpu:NoSchedule".parse::<Toleration>().unwrap())
///     .include_readme(false)
///     .build()?;
/// # Ok(())
/// # }
/// ```
pub struct SettingsBuilder {
    bundler_version: Option<String>,
    include_readme: bool,
    include_checksums: bool,
    verbose: bool,
    value_overrides: BTreeMap<String, OverrideSet>,
    system: Placement,
    accelerated: Placement,
}

impl Default for SettingsBuilder {
    fn default() -> Self {
        Self {
            bundler_version: None,
            include_readme: true,
            include_checksums: true,
            verbose: false,
            value_overrides: BTreeMap::new(),
            system: Placement::default(),
            accelerated: Placement::default(),
        }
    }
}

impl SettingsBuilder {
    /// Creates a new settings builder.
    pub fn new() -> Self {
        Default::default()
    }

    /// Applies every field present in a configuration file.
    ///
    /// Map-like fields (overrides, selectors) are merged entry by entry;
    /// toleration lists from the file are appended.
    pub fn file(mut self, file: SettingsFile) -> Result<Self> {
        if let Some(version) = file.bundler_version {
            self.bundler_version = Some(version);
        }
        if let Some(include) = file.include_readme {
            self.include_readme = include;
        }
        if let Some(include) = file.include_checksums {
            self.include_checksums = include;
        }
        if let Some(verbose) = file.verbose {
            self.verbose = verbose;
        }

        for (component, set) in file.overrides {
            self.value_overrides.entry(component).or_default().extend(set);
        }

        for (tier, placement) in [
            (&mut self.system, file.placement.system),
            (&mut self.accelerated, file.placement.accelerated),
        ] {
            tier.node_selector.extend(placement.node_selector);
            for raw in placement.tolerations {
                let toleration = raw
                    .parse::<Toleration>()
                    .map_err(Error::InvalidRequest)
                    .with_context(|| format!("parsing toleration `{raw}` from configuration"))?;
                tier.tolerations.push(toleration);
            }
        }

        Ok(self)
    }

    /// Sets the bundler version recorded in generated files.
    ///
    /// Default: this crate's package version
    pub fn bundler_version(mut self, version: impl Into<String>) -> Self {
        self.bundler_version = Some(version.into());
        self
    }

    /// Enables or disables `README.md` generation.
    ///
    /// Default: `true`
    pub fn include_readme(mut self, include: bool) -> Self {
        self.include_readme = include;
        self
    }

    /// Enables or disables `checksums.txt` generation.
    ///
    /// Default: `true`
    pub fn include_checksums(mut self, include: bool) -> Self {
        self.include_checksums = include;
        self
    }

    /// Enables verbose output.
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Adds a single `path=value` override for `component`.
    ///
    /// `component` may be the component name or one of its override keys.
    pub fn value_override(
        mut self,
        component: impl Into<String>,
        path: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.value_overrides
            .entry(component.into())
            .or_default()
            .insert(path.into(), value.into());
        self
    }

    /// Adds a system-tier node selector label.
    pub fn system_node_selector(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.system.node_selector.insert(key.into(), value.into());
        self
    }

    /// Adds a system-tier toleration.
    pub fn system_node_toleration(mut self, toleration: Toleration) -> Self {
        self.system.tolerations.push(toleration);
        self
    }

    /// Adds an accelerated-tier node selector label.
    pub fn accelerated_node_selector(
        mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.accelerated.node_selector.insert(key.into(), value.into());
        self
    }

    /// Adds an accelerated-tier toleration.
    pub fn accelerated_node_toleration(mut self, toleration: Toleration) -> Self {
        self.accelerated.tolerations.push(toleration);
        self
    }

    /// Builds the settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the bundler version is empty.
    pub fn build(self) -> Result<Settings> {
        let bundler_version = self
            .bundler_version
            .unwrap_or_else(|| env!("CARGO_PKG_VERSION").to_string());

        if bundler_version.trim().is_empty() {
            return Err(Error::InvalidRequest(
                "bundler_version cannot be empty".to_string(),
            ));
        }

        Ok(Settings::new(
            bundler_version,
            self.include_readme,
            self.include_checksums,
            self.verbose,
            self.value_overrides,
            self.system,
            self.accelerated,
        ))
    }
}
