//! Bundle build results.

use std::{
    path::{Path, PathBuf},
    time::Duration,
};

/// Outcome of one successful component build.
///
/// Produced once by the orchestrator and read-only afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleResult {
    component: String,
    bundle_dir: PathBuf,
    files: Vec<PathBuf>,
    size: u64,
    duration: Duration,
}

impl BundleResult {
    /// Component the bundle was built for.
    pub fn component(&self) -> &str {
        &self.component
    }

    /// Root directory of the bundle.
    pub fn bundle_dir(&self) -> &Path {
        &self.bundle_dir
    }

    /// Generated files in the order they were written.
    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    /// Total size of all generated files in bytes.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Wall-clock time the build took.
    pub fn duration(&self) -> Duration {
        self.duration
    }
}

/// Accumulates a [`BundleResult`] while a build is in progress.
#[derive(Debug)]
pub(crate) struct ResultBuilder {
    component: String,
    bundle_dir: PathBuf,
    files: Vec<PathBuf>,
    size: u64,
}

impl ResultBuilder {
    pub(crate) fn new(component: &str, bundle_dir: &Path) -> Self {
        Self {
            component: component.to_string(),
            bundle_dir: bundle_dir.to_path_buf(),
            files: Vec::new(),
            size: 0,
        }
    }

    pub(crate) fn add_file(&mut self, path: PathBuf, size: u64) {
        self.files.push(path);
        self.size += size;
    }

    /// Finalizes the result. Consumes the builder so no further files can
    /// be recorded.
    pub(crate) fn finish(self, duration: Duration) -> BundleResult {
        BundleResult {
            component: self.component,
            bundle_dir: self.bundle_dir,
            files: self.files,
            size: self.size,
            duration,
        }
    }
}
