//! Node placement injection.
//!
//! Node selectors and tolerations are treated as complete objects: whatever
//! sits at a target path is replaced wholesale, never merged key by key.

use super::{
    ValueTree,
    merge::{split_path, walk_mut},
};
use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use std::{collections::BTreeMap, fmt, str::FromStr};

/// Flat `label -> value` node selector.
pub type NodeSelector = BTreeMap<String, String>;

/// Kubernetes toleration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Toleration {
    /// Taint key to match. Empty with `Exists` matches every taint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,

    /// `Equal` or `Exists`.
    #[serde(default = "default_operator")]
    pub operator: String,

    /// Taint value for `Equal`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,

    /// `NoSchedule`, `PreferNoSchedule`, or `NoExecute`. Empty matches all.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effect: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub toleration_seconds: Option<i64>,
}

fn default_operator() -> String {
    "Equal".to_string()
}

impl FromStr for Toleration {
    type Err = String;

    /// Parses `key=value:Effect`, `key:Effect`, `key=value`, or `key`.
    ///
    /// A toleration without a value uses the `Exists` operator.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err("toleration cannot be empty".to_string());
        }

        let (selector, effect) = match s.rsplit_once(':') {
            Some((selector, effect)) if !effect.is_empty() => (selector, Some(effect)),
            Some(_) => return Err(format!("toleration `{s}` has an empty effect")),
            None => (s, None),
        };

        let (key, value) = match selector.split_once('=') {
            Some((key, value)) => (key, Some(value)),
            None => (selector, None),
        };

        if let Some(effect) = effect {
            if !matches!(effect, "NoSchedule" | "PreferNoSchedule" | "NoExecute") {
                return Err(format!(
                    "toleration `{s}` has unknown effect `{effect}` \
                     (expected NoSchedule, PreferNoSchedule or NoExecute)"
                ));
            }
        }

        let key = (!key.is_empty()).then(|| key.to_string());
        let operator = if value.is_some() { "Equal" } else { "Exists" };

        Ok(Self {
            key,
            operator: operator.to_string(),
            value: value.map(String::from),
            effect: effect.map(String::from),
            toleration_seconds: None,
        })
    }
}

impl fmt::Display for Toleration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key.as_deref().unwrap_or(""))?;
        if let Some(value) = &self.value {
            write!(f, "={value}")?;
        }
        if let Some(effect) = &self.effect {
            write!(f, ":{effect}")?;
        }
        Ok(())
    }
}

/// Parses a `key=value` node selector entry.
pub fn parse_selector_entry(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.trim().to_string()))
        }
        _ => Err(format!("node selector `{s}` must be in key=value form")),
    }
}

/// Affinity-style selector term used by templates that cannot take a flat
/// `nodeSelector` map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchExpression {
    pub key: String,
    pub operator: String,
    pub values: Vec<String>,
}

/// Converts a flat selector into `In` match expressions, one per label.
pub fn node_selector_to_match_expressions(selector: &NodeSelector) -> Vec<MatchExpression> {
    selector
        .iter()
        .map(|(key, value)| MatchExpression {
            key: key.clone(),
            operator: "In".to_string(),
            values: vec![value.clone()],
        })
        .collect()
}

/// Writes `selector` as a mapping at every path in `paths`.
///
/// An empty selector leaves the tree untouched. Returns the number of paths
/// written.
pub fn apply_node_selector(tree: &mut ValueTree, selector: &NodeSelector, paths: &[&str]) -> usize {
    if selector.is_empty() {
        return 0;
    }

    let value = Value::Mapping(
        selector
            .iter()
            .map(|(k, v)| (Value::String(k.clone()), Value::String(v.clone())))
            .collect(),
    );
    replace_at_paths(tree, &value, paths)
}

/// Writes `tolerations` as a sequence at every path in `paths`.
///
/// An empty list leaves the tree untouched. Returns the number of paths
/// written.
pub fn apply_tolerations(tree: &mut ValueTree, tolerations: &[Toleration], paths: &[&str]) -> usize {
    if tolerations.is_empty() {
        return 0;
    }

    let value = match serde_yaml::to_value(tolerations) {
        Ok(value) => value,
        Err(e) => {
            log::warn!("Skipping toleration injection: {e}");
            return 0;
        }
    };
    replace_at_paths(tree, &value, paths)
}

fn replace_at_paths(tree: &mut ValueTree, value: &Value, paths: &[&str]) -> usize {
    let mut written = 0;
    for path in paths {
        let segments = match split_path(path) {
            Ok(segments) => segments,
            Err(e) => {
                log::warn!("Skipping placement target: {e}");
                continue;
            }
        };
        let Some((leaf, parents)) = segments.split_last() else {
            continue;
        };

        // Placement is authoritative: incompatible intermediates are replaced.
        let parent = walk_mut(tree, parents);
        parent.insert(Value::String((*leaf).to_string()), value.clone());
        written += 1;
    }
    written
}
