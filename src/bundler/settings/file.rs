//! `bundler.toml` configuration file.
//!
//! ```toml
//! include_readme = true
//! include_checksums = true
//!
//! [overrides.gpu-operator]
//! "driver.version" = "570.86.15"
//!
//! [placement.system]
//! node_selector = { nodeGroup = "system" }
//! tolerations = ["dedicated=system:NoSchedule"]
//!
//! [placement.accelerated]
//! node_selector = { "nvidia.com/gpu.present" = "true" }
//! tolerations = ["nvidia.com/gpu:NoSchedule"]
//! ```

use crate::bundler::{
    error::{ErrorExt, Result},
    values::{NodeSelector, OverrideSet},
};
use serde::Deserialize;
use std::{collections::BTreeMap, path::Path};

/// Deserialized `bundler.toml`. Every field is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SettingsFile {
    pub bundler_version: Option<String>,
    pub include_readme: Option<bool>,
    pub include_checksums: Option<bool>,
    pub verbose: Option<bool>,

    /// Overrides keyed by component name or override key.
    pub overrides: BTreeMap<String, OverrideSet>,

    pub placement: PlacementFile,
}

/// `[placement]` table.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PlacementFile {
    pub system: TierFile,
    pub accelerated: TierFile,
}

/// One tier under `[placement]`.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TierFile {
    pub node_selector: NodeSelector,

    /// Tolerations in `key=value:Effect` form.
    pub tolerations: Vec<String>,
}

impl SettingsFile {
    /// Reads and parses a configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let content =
            std::fs::read_to_string(path).fs_context("reading bundler configuration", path)?;
        Self::parse(&content)
    }

    /// Parses configuration from TOML text.
    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }
}
