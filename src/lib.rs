//! Helm bundle assembly library.
//!
//! Turns the components of a deployment recipe into self-contained bundle
//! directories:
//! - `values.yaml` with overrides and node placement applied
//! - component manifests (e.g. DCGM metrics ConfigMap, Skyhook resources)
//! - a rendered `README.md`
//! - a `checksums.txt` SHA-256 manifest
//!
//! It can be used both as a CLI tool and as a library dependency.

pub mod bundler;
pub mod cli;
pub mod components;
pub mod error;
pub mod metadata;
pub mod recipe;

// Re-export commonly used types
pub use error::{BundlerError, CliError, Result};
