//! Helm value trees and the transformations applied to them.
//!
//! - [`merge`] - dot-notation overrides with type coercion
//! - [`placement`] - node selector and toleration injection

pub mod merge;
pub mod placement;

use std::collections::BTreeMap;

/// Nested Helm values document.
pub type ValueTree = serde_yaml::Value;

/// Flat `dot.path -> value` overrides for one component.
///
/// Ordered so that applying a set is deterministic across runs.
pub type OverrideSet = BTreeMap<String, String>;

pub use merge::{MergeReport, PathError, apply_overrides, get_value_by_path, set_value_by_path};
pub use placement::{
    MatchExpression, NodeSelector, Toleration, apply_node_selector, apply_tolerations,
    node_selector_to_match_expressions, parse_selector_entry,
};
