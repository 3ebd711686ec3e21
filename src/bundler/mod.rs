//! Bundle assembly engine.
//!
//! Turns a recipe component into a directory containing `values.yaml`,
//! optional component manifests, `README.md`, and `checksums.txt`.
//!
//! - [`builder`] - the [`Bundler`] pipeline, checksums, and results
//! - [`values`] - override merging and placement injection
//! - [`template`] - Handlebars rendering
//! - [`settings`] - shared, read-only configuration
//! - [`error`] - classified errors

pub mod builder;
pub mod error;
pub mod settings;
pub mod template;
pub mod utils;
pub mod values;

pub use builder::{
    BundleResult, Bundler, CHECKSUMS_FILE, README_FILE, VALUES_FILE, generate_checksums,
};
pub use error::{Error, ErrorKind, Result};
pub use settings::{Placement, Settings, SettingsBuilder, SettingsFile};
pub use template::{METADATA_KEY, README_TEMPLATE, TemplateRenderer, VALUES_KEY};
pub use values::{NodeSelector, OverrideSet, Toleration, ValueTree};
