//! File system utilities for bundling.
//!
//! Thin wrappers that attach the operation and path to every I/O failure.

use crate::bundler::error::{ErrorExt, Result};
use std::path::Path;

/// Creates all of the directories of the specified path.
///
/// Succeeds if the directory already exists.
pub fn create_dir_all(path: &Path) -> Result<()> {
    std::fs::create_dir_all(path).fs_context("creating directory", path)
}

/// Removes `path` and everything under it, then recreates it empty.
pub fn recreate_dir(path: &Path) -> Result<()> {
    if path.exists() {
        std::fs::remove_dir_all(path).fs_context("clearing directory", path)?;
    }
    create_dir_all(path)
}

/// Writes `content` to `path`, creating parent directories as needed.
///
/// Returns the number of bytes written.
pub fn write_file(path: &Path, content: impl AsRef<[u8]>) -> Result<u64> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).fs_context("creating parent directory", parent)?;
    }
    let content = content.as_ref();
    std::fs::write(path, content).fs_context("writing file", path)?;
    Ok(content.len() as u64)
}

/// Returns the size in bytes of the file at `path`.
pub fn file_size(path: &Path) -> Result<u64> {
    Ok(std::fs::metadata(path)
        .fs_context("reading file metadata", path)?
        .len())
}
