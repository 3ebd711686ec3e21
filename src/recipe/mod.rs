//! Recipe input.
//!
//! A recipe names the components to deploy, their chart coordinates, and
//! their base Helm values. The assembly engine only depends on the
//! [`RecipeSource`] trait; [`Recipe`] is the YAML-backed implementation the
//! command line uses.
//!
//! ```yaml
//! version: v0.9.0
//! criteria:
//!   accelerator: h100
//!   service: eks
//! componentRefs:
//!   - name: gpu-operator
//!     source: https://helm.ngc.nvidia.com/nvidia
//!     version: v25.3.0
//!     valuesFile: values/gpu-operator.yaml
//!     values:
//!       driver:
//!         enabled: true
//! ```

use crate::bundler::{
    error::{Context, Error, ErrorExt, Result},
    values::ValueTree,
};
use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};
use std::path::{Path, PathBuf};

/// Read access to a recipe, as needed by the orchestrator.
pub trait RecipeSource: Send + Sync {
    /// Returns the reference for `name`, if the recipe contains it.
    fn component_ref(&self, name: &str) -> Option<&ComponentRef>;

    /// Returns the base values for `name`.
    fn values_for_component(&self, name: &str) -> Result<ValueTree>;

    /// Returns the selection criteria the recipe was generated for.
    fn criteria(&self) -> Option<&Criteria>;

    /// Returns the recipe's own version.
    fn version(&self) -> Option<&str> {
        None
    }
}

/// One component instance in a recipe.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentRef {
    pub name: String,

    /// Helm repository URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,

    /// Chart version.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// Chart name, when it differs from the component default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chart: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,

    /// Values file, relative to the recipe file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values_file: Option<PathBuf>,

    /// Inline values, layered over `values_file`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values: Option<ValueTree>,
}

/// Deployment criteria the recipe targets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Criteria {
    /// Accelerator type, e.g. `h100` or `gb200`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accelerator: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intent: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub os: Option<String>,
}

/// YAML recipe document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub criteria: Option<Criteria>,

    #[serde(default)]
    pub component_refs: Vec<ComponentRef>,

    /// Directory `valuesFile` entries are resolved against.
    #[serde(skip)]
    base_dir: Option<PathBuf>,
}

impl Recipe {
    /// Loads a recipe file. Relative `valuesFile` paths resolve against the
    /// file's directory.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).fs_context("reading recipe", path)?;
        let mut recipe = Self::parse(&content)
            .with_context(|| format!("parsing recipe {}", path.display()))?;
        recipe.base_dir = path.parent().map(Path::to_path_buf);
        Ok(recipe)
    }

    /// Parses a recipe from YAML text.
    pub fn parse(content: &str) -> Result<Self> {
        let recipe: Self = serde_yaml::from_str(content)?;

        let mut seen = std::collections::BTreeSet::new();
        for component in &recipe.component_refs {
            if component.name.trim().is_empty() {
                return Err(Error::InvalidRequest(
                    "recipe contains a component without a name".to_string(),
                ));
            }
            if !seen.insert(component.name.as_str()) {
                return Err(Error::InvalidRequest(format!(
                    "recipe lists component `{}` more than once",
                    component.name
                )));
            }
        }

        Ok(recipe)
    }

    /// Names of the components in recipe order.
    pub fn component_names(&self) -> Vec<&str> {
        self.component_refs.iter().map(|c| c.name.as_str()).collect()
    }

    fn resolve(&self, file: &Path) -> PathBuf {
        match &self.base_dir {
            Some(base) if file.is_relative() => base.join(file),
            _ => file.to_path_buf(),
        }
    }
}

impl RecipeSource for Recipe {
    fn component_ref(&self, name: &str) -> Option<&ComponentRef> {
        self.component_refs.iter().find(|c| c.name == name)
    }

    fn values_for_component(&self, name: &str) -> Result<ValueTree> {
        let component = self
            .component_ref(name)
            .ok_or_else(|| Error::InvalidRequest(format!("component `{name}` not in recipe")))?;

        let mut values = match &component.values_file {
            Some(file) => {
                let path = self.resolve(file);
                let content =
                    std::fs::read_to_string(&path).fs_context("reading values file", &path)?;
                serde_yaml::from_str::<Value>(&content)
                    .with_context(|| format!("parsing values file {}", path.display()))?
            }
            None => Value::Mapping(Mapping::new()),
        };
        values = as_mapping(name, values)?;

        if let Some(inline) = &component.values {
            let inline = as_mapping(name, inline.clone())?;
            overlay(&mut values, inline);
        }

        Ok(values)
    }

    fn criteria(&self) -> Option<&Criteria> {
        self.criteria.as_ref()
    }

    fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }
}

fn as_mapping(name: &str, value: Value) -> Result<Value> {
    match value {
        Value::Null => Ok(Value::Mapping(Mapping::new())),
        Value::Mapping(_) => Ok(value),
        other => crate::bail!("values for `{name}` must be a mapping, got {other:?}"),
    }
}

/// Recursively layers `overlay_value` onto `base`; mappings merge, everything
/// else replaces.
fn overlay(base: &mut Value, overlay_value: Value) {
    match (base, overlay_value) {
        (Value::Mapping(base_map), Value::Mapping(over_map)) => {
            for (key, value) in over_map {
                match base_map.get_mut(&key) {
                    Some(existing) => overlay(existing, value),
                    None => {
                        base_map.insert(key, value);
                    }
                }
            }
        }
        (base, value) => *base = value,
    }
}
