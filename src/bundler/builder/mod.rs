//! Bundle orchestration and coordination.
//!
//! This module provides the main [`Bundler`] orchestrator that assembles a
//! component bundle from a recipe and shared [`Settings`](crate::bundler::Settings).
//!
//! # Overview
//!
//! The bundler:
//! 1. Reads the component's base values from the recipe
//! 2. Applies value overrides and node placement policy
//! 3. Writes `values.yaml` and any component manifests
//! 4. Renders documentation and calculates checksums
//! 5. Returns a [`BundleResult`]
//!
//! # Module Organization
//!
//! - [`checksum`] - SHA-256 checksum manifest for bundle directories
//! - [`orchestrator`] - Main [`Bundler`] struct and the assembly pipeline
//! - [`result`] - [`BundleResult`] and its in-progress builder

pub mod checksum;
mod orchestrator;
mod result;

pub use checksum::{CHECKSUMS_FILE, calculate_file_sha256, generate_checksums};
pub use orchestrator::{Bundler, README_FILE, VALUES_FILE};
pub use result::BundleResult;
