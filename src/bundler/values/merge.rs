//! Dot-notation override merging.
//!
//! Overrides such as `driver.version=570.86.15` are applied to a
//! [`ValueTree`] by walking (and creating) intermediate mappings along the
//! path and setting the leaf. A failing override never aborts the merge; it
//! is reported in [`MergeReport::skipped`] and the remaining overrides still
//! apply.

use super::{OverrideSet, ValueTree};
use serde_yaml::{Mapping, Value};
use thiserror::Error;

/// Failure to apply a single override path.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    /// Path is empty or contains an empty segment (`a..b`).
    #[error("invalid path `{path}`")]
    InvalidPath {
        /// Offending path.
        path: String,
    },

    /// An intermediate segment holds a scalar or sequence.
    #[error("cannot set `{path}`: `{segment}` holds a {found}, not a mapping")]
    NotAMapping {
        /// Full override path.
        path: String,
        /// Path prefix that resolved to a non-mapping value, `<root>` for the
        /// document itself.
        segment: String,
        /// Kind of value found there.
        found: &'static str,
    },
}

/// Outcome of [`apply_overrides`].
#[derive(Debug, Default)]
pub struct MergeReport {
    /// Paths that were written.
    pub applied: Vec<String>,
    /// Overrides that could not be applied.
    pub skipped: Vec<PathError>,
}

impl MergeReport {
    /// Returns true when every override was applied.
    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty()
    }
}

/// Applies every override in `overrides` to `tree`.
///
/// Entries are applied in the set's (lexicographic) order, so when one path
/// is a prefix of another the shorter one is written first.
pub fn apply_overrides(tree: &mut ValueTree, overrides: &OverrideSet) -> MergeReport {
    let mut report = MergeReport::default();

    for (path, raw) in overrides {
        match set_value_by_path(tree, path, raw) {
            Ok(()) => report.applied.push(path.clone()),
            Err(e) => report.skipped.push(e),
        }
    }

    report
}

/// Sets the leaf at dot-separated `path` to `raw`.
///
/// The string is coerced into the type already stored at the leaf (boolean,
/// integer, float) when it parses as that type; otherwise it is stored as a
/// string. On error the tree is left unchanged.
pub fn set_value_by_path(tree: &mut ValueTree, path: &str, raw: &str) -> Result<(), PathError> {
    let segments = split_path(path)?;
    let (leaf, parents) = segments
        .split_last()
        .ok_or_else(|| PathError::InvalidPath {
            path: path.to_string(),
        })?;

    // Validate before mutating so a rejected override leaves no stray maps.
    check_walkable(tree, path, parents)?;

    let parent = walk_mut(tree, parents);
    let key = Value::String((*leaf).to_string());
    let coerced = coerce(parent.get(&key), raw);
    parent.insert(key, coerced);
    Ok(())
}

/// Returns the value at dot-separated `path`, if present.
pub fn get_value_by_path<'a>(tree: &'a ValueTree, path: &str) -> Option<&'a Value> {
    let mut current = tree;
    for segment in path.split('.') {
        current = current.as_mapping()?.get(segment)?;
    }
    Some(current)
}

pub(super) fn split_path(path: &str) -> Result<Vec<&str>, PathError> {
    let segments: Vec<&str> = path.split('.').collect();
    if path.is_empty() || segments.iter().any(|s| s.is_empty()) {
        return Err(PathError::InvalidPath {
            path: path.to_string(),
        });
    }
    Ok(segments)
}

/// Walks `parents`, creating or replacing containers so that a mapping
/// exists at the end of the walk. Callers that must not clobber data run
/// [`check_walkable`] first.
pub(super) fn walk_mut<'a>(tree: &'a mut ValueTree, parents: &[&str]) -> &'a mut Mapping {
    let mut current = ensure_mapping(tree);
    for segment in parents {
        let child = current
            .entry(Value::String((*segment).to_string()))
            .or_insert(Value::Null);
        current = ensure_mapping(child);
    }
    current
}

fn check_walkable(tree: &ValueTree, path: &str, parents: &[&str]) -> Result<(), PathError> {
    let mut current = match tree {
        Value::Mapping(map) => map,
        // A null root becomes an empty mapping; nothing below it exists yet.
        Value::Null => return Ok(()),
        other => {
            return Err(PathError::NotAMapping {
                path: path.to_string(),
                segment: "<root>".to_string(),
                found: kind_of(other),
            });
        }
    };

    for (depth, segment) in parents.iter().enumerate() {
        match current.get(*segment) {
            None | Some(Value::Null) => return Ok(()),
            Some(Value::Mapping(map)) => current = map,
            Some(other) => {
                return Err(PathError::NotAMapping {
                    path: path.to_string(),
                    segment: parents[..=depth].join("."),
                    found: kind_of(other),
                });
            }
        }
    }
    Ok(())
}

fn ensure_mapping(value: &mut Value) -> &mut Mapping {
    if !value.is_mapping() {
        *value = Value::Mapping(Mapping::new());
    }
    match value {
        Value::Mapping(map) => map,
        _ => unreachable!("value was just replaced with a mapping"),
    }
}

fn coerce(existing: Option<&Value>, raw: &str) -> Value {
    match existing {
        Some(Value::Bool(_)) => match raw.parse::<bool>() {
            Ok(b) => Value::Bool(b),
            Err(_) => Value::String(raw.to_string()),
        },
        Some(Value::Number(_)) => {
            if let Ok(i) = raw.parse::<i64>() {
                Value::Number(i.into())
            } else if let Ok(f) = raw.parse::<f64>() {
                Value::Number(f.into())
            } else {
                Value::String(raw.to_string())
            }
        }
        _ => Value::String(raw.to_string()),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Sequence(_) => "sequence",
        Value::Mapping(_) => "mapping",
        Value::Tagged(_) => "tagged value",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree(yaml: &str) -> ValueTree {
        serde_yaml::from_str(yaml).unwrap()
    }

    fn overrides(pairs: &[(&str, &str)]) -> OverrideSet {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn creates_intermediate_mappings() {
        let mut values = tree("{}");
        set_value_by_path(&mut values, "driver.rdma.enabled", "true").unwrap();
        assert_eq!(values, tree("driver: {rdma: {enabled: 'true'}}"));
    }

    #[test]
    fn coerces_into_existing_types() {
        let mut values = tree(
            r#"
driver:
  enabled: false
  replicas: 1
  ratio: 0.5
  version: "550"
"#,
        );
        let report = apply_overrides(
            &mut values,
            &overrides(&[
                ("driver.enabled", "true"),
                ("driver.replicas", "3"),
                ("driver.ratio", "0.75"),
                ("driver.version", "570"),
            ]),
        );
        assert!(report.is_clean());
        assert_eq!(
            values,
            tree(
                r#"
driver:
  enabled: true
  replicas: 3
  ratio: 0.75
  version: "570"
"#
            )
        );
    }

    #[test]
    fn unparsable_value_falls_back_to_string() {
        let mut values = tree("enabled: false");
        set_value_by_path(&mut values, "enabled", "maybe").unwrap();
        assert_eq!(values, tree("enabled: maybe"));
    }

    #[test]
    fn scalar_intermediate_skips_only_that_override() {
        let mut values = tree("driver: nvidia\nkeep: 1");
        let report = apply_overrides(
            &mut values,
            &overrides(&[("driver.version", "570"), ("toolkit.enabled", "true")]),
        );

        assert_eq!(report.applied, vec!["toolkit.enabled".to_string()]);
        assert_eq!(
            report.skipped,
            vec![PathError::NotAMapping {
                path: "driver.version".into(),
                segment: "driver".into(),
                found: "string",
            }]
        );
        assert_eq!(
            values,
            tree("driver: nvidia\nkeep: 1\ntoolkit: {enabled: 'true'}")
        );
    }

    #[test]
    fn rejected_override_leaves_no_partial_maps() {
        let mut values = tree("a: {b: [1, 2]}");
        let before = values.clone();
        assert!(set_value_by_path(&mut values, "a.b.c.d", "x").is_err());
        assert_eq!(values, before);
    }

    #[test]
    fn null_intermediate_becomes_mapping() {
        let mut values = tree("operator: ~");
        set_value_by_path(&mut values, "operator.image", "custom").unwrap();
        assert_eq!(values, tree("operator: {image: custom}"));
    }

    #[test]
    fn invalid_paths_are_rejected() {
        let mut values = tree("{}");
        for path in ["", "a..b", ".a", "a."] {
            assert!(matches!(
                set_value_by_path(&mut values, path, "x"),
                Err(PathError::InvalidPath { .. })
            ));
        }
    }

    #[test]
    fn merge_is_idempotent() {
        let mut once = tree("driver: {version: '550', enabled: true}\nother: [1]");
        let set = overrides(&[
            ("driver.version", "570"),
            ("driver.enabled", "false"),
            ("toolkit.env.path", "/usr/local"),
        ]);
        apply_overrides(&mut once, &set);
        let mut twice = once.clone();
        apply_overrides(&mut twice, &set);
        assert_eq!(once, twice);
    }

    #[test]
    fn untargeted_data_survives() {
        let mut values = tree("a: {b: 1, c: {d: 2}}\ne: [x, y]");
        set_value_by_path(&mut values, "a.c.f", "3").unwrap();
        assert_eq!(values, tree("a: {b: 1, c: {d: 2, f: '3'}}\ne: [x, y]"));
    }

    #[test]
    fn prefix_override_blocks_longer_path() {
        let mut values = tree("{}");
        let report = apply_overrides(&mut values, &overrides(&[("a", "x"), ("a.b", "y")]));
        assert_eq!(report.applied, vec!["a".to_string()]);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(values, tree("a: x"));
    }

    #[test]
    fn null_root_becomes_mapping() {
        let mut values = Value::Null;
        set_value_by_path(&mut values, "a.b", "1").unwrap();
        assert_eq!(values, tree("a: {b: '1'}"));
    }

    #[test]
    fn sequence_root_is_left_untouched() {
        let mut values = tree("[x, y]");
        let err = set_value_by_path(&mut values, "a.b", "1").unwrap_err();
        assert_eq!(
            err,
            PathError::NotAMapping {
                path: "a.b".to_string(),
                segment: "<root>".to_string(),
                found: "sequence",
            }
        );
        assert_eq!(values, tree("[x, y]"));

        let mut scalar = tree("just-a-string");
        let report = apply_overrides(&mut scalar, &overrides(&[("a", "1")]));
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(scalar, tree("just-a-string"));
    }

    #[test]
    fn reads_nested_values() {
        let values = tree("a: {b: {c: 5}}");
        assert_eq!(get_value_by_path(&values, "a.b.c"), Some(&Value::from(5)));
        assert_eq!(get_value_by_path(&values, "a.x"), None);
    }
}
