//! Cache root maintenance.
//!
//! [`validate_version`] keeps a `VERSION` file in the cache root. If the
//! stored version differs from the running build (or is missing), the whole
//! tree is wiped and recreated, so entries serialized by an incompatible
//! build are never read.

use std::fs;
use std::io;
use std::path::Path;

const VERSION_FILE: &str = "VERSION";

/// Validate the cache version, wiping the cache root on mismatch.
///
/// Errors are logged, never fatal.
pub fn validate_version(root: &Path, version: &str) {
    let version_file = root.join(VERSION_FILE);

    match fs::read_to_string(&version_file) {
        Ok(stored) if stored == version => {
            tracing::debug!(version, "cache version matches");
            return;
        }
        Ok(stored) => {
            tracing::info!(stored = %stored, current = version, "cache version mismatch, wiping cache");
        }
        Err(_) => {
            tracing::info!(root = %root.display(), "no cache VERSION file found, initializing cache");
        }
    }

    purge_all(root);
    if let Err(e) = fs::create_dir_all(root) {
        tracing::warn!(error = %e, "failed to create cache directory");
        return;
    }
    if let Err(e) = fs::write(&version_file, version) {
        tracing::warn!(error = %e, "failed to write cache VERSION file");
    }
}

/// Remove the whole cache tree. A missing root is not an error.
pub fn purge_all(root: &Path) {
    match fs::remove_dir_all(root) {
        Ok(()) => tracing::info!(root = %root.display(), "cache purged"),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!(root = %root.display(), error = %e, "failed to remove cache directory"),
    }
}
