//! Bundle checksum manifest.
//!
//! After every other file is written, the bundle directory is walked and a
//! SHA-256 digest is recorded per regular file in `checksums.txt`:
//!
//! ```text
//! README.md 3f0a…
//! manifests/dcgm-metrics.yaml 9c1e…
//! values.yaml 7b52…
//! ```
//!
//! Paths are relative, `/`-separated, and sorted, so identical bundles yield
//! byte-identical manifests. The manifest never lists itself.

use crate::bundler::error::{Error, ErrorExt, Result};
use sha2::{Digest, Sha256};
use std::{
    io::Read,
    path::{Path, PathBuf},
};
use tokio_util::sync::CancellationToken;

/// File name of the checksum manifest at the bundle root.
pub const CHECKSUMS_FILE: &str = "checksums.txt";

/// Writes `checksums.txt` for the bundle rooted at `bundle_dir`.
///
/// Cancellation is checked before each file is hashed.
///
/// # Returns
///
/// Path to the written manifest.
pub fn generate_checksums(bundle_dir: &Path, cancel: &CancellationToken) -> Result<PathBuf> {
    let manifest_path = bundle_dir.join(CHECKSUMS_FILE);
    let content = checksum_manifest(bundle_dir, cancel)?;

    std::fs::write(&manifest_path, content).fs_context("writing checksum manifest", &manifest_path)?;
    log::debug!("Wrote checksum manifest {}", manifest_path.display());

    Ok(manifest_path)
}

/// Builds the manifest text without writing it.
pub fn checksum_manifest(bundle_dir: &Path, cancel: &CancellationToken) -> Result<String> {
    let manifest_path = bundle_dir.join(CHECKSUMS_FILE);

    let mut files = Vec::new();
    for entry in walkdir::WalkDir::new(bundle_dir).follow_links(false) {
        let entry = entry?;
        if !entry.file_type().is_file() || entry.path() == manifest_path {
            continue;
        }
        let rel = entry
            .path()
            .strip_prefix(bundle_dir)
            .map_err(|e| Error::GenericError(format!("walking bundle directory: {e}")))?;
        files.push((relative_key(rel), entry.into_path()));
    }

    // Sort on the joined string, not per directory level, so `a/b` and
    // `a.txt` compare the same way on every platform.
    files.sort_by(|a, b| a.0.cmp(&b.0));

    let mut manifest = String::new();
    for (rel, path) in files {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled(format!(
                "checksum generation at {}",
                path.display()
            )));
        }
        let digest = calculate_file_sha256(&path)?;
        manifest.push_str(&rel);
        manifest.push(' ');
        manifest.push_str(&digest);
        manifest.push('\n');
    }

    Ok(manifest)
}

/// Calculates the SHA-256 of a single file, reading it in 8KB chunks.
///
/// # Returns
///
/// Hex-encoded digest (64 lowercase characters).
pub fn calculate_file_sha256(file_path: &Path) -> Result<String> {
    let mut file =
        std::fs::File::open(file_path).fs_context("opening file for hashing", file_path)?;
    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; 8192];

    loop {
        let n = file
            .read(&mut buffer)
            .fs_context("reading file for hash calculation", file_path)?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
    }

    Ok(hex::encode(hasher.finalize()))
}

fn relative_key(rel: &Path) -> String {
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
