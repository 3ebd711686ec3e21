//! Command line argument parsing and validation.
//!
//! This module provides CLI argument parsing using clap, plus the parsers
//! for the `--set` and placement flag formats.

use crate::bundler::{
    SettingsBuilder, SettingsFile, Toleration,
    values::parse_selector_entry,
};
use clap::Parser;
use std::path::PathBuf;

/// Deterministic Helm bundles for Kubernetes operator components
#[derive(Parser, Debug)]
#[command(
    name = "kodegen_bundler_helm",
    version,
    about = "Deterministic Helm bundles for Kubernetes operator components",
    long_about = "Reads a deployment recipe and writes one bundle directory per component:
values.yaml (overrides and node placement applied), component manifests,
README.md and checksums.txt.

Usage:
  kodegen_bundler_helm --recipe recipe.yaml --output ./bundles
  kodegen_bundler_helm -r recipe.yaml -c gpu-operator --set gpu-operator:driver.version=570.86.15
  kodegen_bundler_helm -r recipe.yaml --accelerated-node-selector nodeGroup=gpu \\
      --accelerated-node-toleration dedicated=gpu:NoSchedule

Exit code 0 = every requested bundle was written."
)]
pub struct Args {
    /// Recipe file listing the components to bundle
    #[arg(
        short = 'r',
        long,
        value_name = "FILE",
        required_unless_present = "list_components"
    )]
    pub recipe: Option<PathBuf>,

    /// Directory bundles are written into, one subdirectory per component
    #[arg(short = 'o', long, value_name = "DIR", default_value = "bundles")]
    pub output: PathBuf,

    /// Component to bundle (repeatable). Defaults to every recipe component.
    #[arg(short = 'c', long = "component", value_name = "NAME")]
    pub components: Vec<String>,

    /// TOML configuration file; command line flags take precedence
    #[arg(long, value_name = "FILE", env = "KODEGEN_BUNDLER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Value override in `component:path=value` form (repeatable)
    #[arg(long = "set", value_name = "COMPONENT:PATH=VALUE", value_parser = parse_override)]
    pub overrides: Vec<ValueOverride>,

    /// System-tier node selector label in `key=value` form (repeatable)
    #[arg(long, value_name = "KEY=VALUE", value_parser = parse_selector_entry)]
    pub system_node_selector: Vec<(String, String)>,

    /// System-tier toleration in `key=value:Effect` form (repeatable)
    #[arg(long, value_name = "TOLERATION")]
    pub system_node_toleration: Vec<Toleration>,

    /// Accelerated-tier node selector label in `key=value` form (repeatable)
    #[arg(long, value_name = "KEY=VALUE", value_parser = parse_selector_entry)]
    pub accelerated_node_selector: Vec<(String, String)>,

    /// Accelerated-tier toleration in `key=value:Effect` form (repeatable)
    #[arg(long, value_name = "TOLERATION")]
    pub accelerated_node_toleration: Vec<Toleration>,

    /// Skip README.md generation
    #[arg(long)]
    pub no_readme: bool,

    /// Skip checksums.txt generation
    #[arg(long)]
    pub no_checksums: bool,

    /// Print the supported components and exit
    #[arg(long)]
    pub list_components: bool,

    /// Detailed progress output
    #[arg(short, long)]
    pub verbose: bool,
}

/// One `--set component:path=value` flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueOverride {
    pub component: String,
    pub path: String,
    pub value: String,
}

/// Parses `component:path=value`. The value may itself contain `=` or `:`.
pub fn parse_override(s: &str) -> Result<ValueOverride, String> {
    let (component, rest) = s
        .split_once(':')
        .ok_or_else(|| format!("override `{s}` must be in component:path=value form"))?;
    let (path, value) = rest
        .split_once('=')
        .ok_or_else(|| format!("override `{s}` must be in component:path=value form"))?;

    let component = component.trim();
    let path = path.trim();
    if component.is_empty() || path.is_empty() {
        return Err(format!("override `{s}` has an empty component or path"));
    }

    Ok(ValueOverride {
        component: component.to_string(),
        path: path.to_string(),
        value: value.to_string(),
    })
}

impl Args {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate arguments for consistency
    pub fn validate(&self) -> Result<(), String> {
        if self.output.as_os_str().is_empty() {
            return Err("Output directory cannot be empty".to_string());
        }

        let mut seen = std::collections::BTreeSet::new();
        for name in &self.components {
            if !seen.insert(name) {
                return Err(format!("Component `{name}` was requested more than once"));
            }
        }

        Ok(())
    }

    /// Layers these flags over `file` (if any) into a settings builder.
    ///
    /// File values are applied first, so every flag given here wins.
    pub fn settings_builder(
        &self,
        file: Option<SettingsFile>,
    ) -> crate::bundler::Result<SettingsBuilder> {
        let mut builder = SettingsBuilder::new();
        if let Some(file) = file {
            builder = builder.file(file)?;
        }

        if self.no_readme {
            builder = builder.include_readme(false);
        }
        if self.no_checksums {
            builder = builder.include_checksums(false);
        }
        if self.verbose {
            builder = builder.verbose(true);
        }

        for o in &self.overrides {
            builder = builder.value_override(&o.component, &o.path, &o.value);
        }
        for (key, value) in &self.system_node_selector {
            builder = builder.system_node_selector(key, value);
        }
        for toleration in &self.system_node_toleration {
            builder = builder.system_node_toleration(toleration.clone());
        }
        for (key, value) in &self.accelerated_node_selector {
            builder = builder.accelerated_node_selector(key, value);
        }
        for toleration in &self.accelerated_node_toleration {
            builder = builder.accelerated_node_toleration(toleration.clone());
        }

        Ok(builder)
    }
}
