//! A single cache entry addressed by key and purpose.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use serde::Serialize;
use serde::de::DeserializeOwned;
use sha2::{Digest, Sha256};
use tempfile::NamedTempFile;

use crate::{CacheConfig, CacheMode, RAW_EXT, STRUCTURED_EXT};

/// Handle to one cache entry.
///
/// Opening a handle only computes the entry path; the filesystem is first
/// touched by [`retrieve`](Self::retrieve), [`store`](Self::store) or
/// [`purge`](Self::purge). The key itself is never written to disk, only
/// its SHA-256 hash.
#[derive(Clone, Debug)]
pub struct Cache {
    path: PathBuf,
    enabled: bool,
    mode: CacheMode,
    raw: bool,
}

impl Cache {
    /// Open a structured entry. Values are stored as JSON.
    #[must_use]
    pub fn open(key: impl AsRef<[u8]>, purpose: &str, config: &CacheConfig) -> Self {
        Self::with_payload(key.as_ref(), purpose, config, false)
    }

    /// Open a raw entry. Values are stored as opaque bytes.
    #[must_use]
    pub fn open_raw(key: impl AsRef<[u8]>, purpose: &str, config: &CacheConfig) -> Self {
        Self::with_payload(key.as_ref(), purpose, config, true)
    }

    fn with_payload(key: &[u8], purpose: &str, config: &CacheConfig, raw: bool) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(key);
        hasher.update(purpose.as_bytes());
        let hash = hex::encode(hasher.finalize());

        let ext = if raw { RAW_EXT } else { STRUCTURED_EXT };
        let path = config
            .dir
            .join(purpose)
            .join(&hash[0..2])
            .join(&hash[2..4])
            .join(format!("{hash}.{ext}"));

        Self {
            path,
            enabled: config.enabled,
            mode: config.mode,
            raw,
        }
    }

    /// Location of the entry on disk.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the entry holds raw bytes rather than a serialized value.
    #[must_use]
    pub fn is_raw(&self) -> bool {
        self.raw
    }

    /// Whether the entry exists and was written after `reference`.
    ///
    /// Always `false` when the cache is disabled or in debug/purge mode.
    #[must_use]
    pub fn is_valid(&self, reference: SystemTime) -> bool {
        if !self.enabled || self.mode != CacheMode::Normal {
            return false;
        }
        entry_mtime(&self.path).is_some_and(|mtime| mtime > reference)
    }

    /// Read the entry bytes if the entry is fresh relative to `reference`.
    #[must_use]
    pub fn retrieve_raw(&self, reference: SystemTime) -> Option<Vec<u8>> {
        if self.enabled && self.mode == CacheMode::Purge {
            self.purge();
            return None;
        }
        if !self.is_valid(reference) {
            tracing::debug!(path = %self.path.display(), "cache miss");
            return None;
        }
        match fs::read(&self.path) {
            Ok(bytes) => {
                tracing::debug!(path = %self.path.display(), "cache hit");
                Some(bytes)
            }
            Err(e) => {
                tracing::debug!(path = %self.path.display(), error = %e, "cache read failed");
                None
            }
        }
    }

    /// Read and deserialize the entry if it is fresh relative to `reference`.
    ///
    /// A payload that fails to deserialize (truncated or written by an
    /// incompatible build) is a miss.
    #[must_use]
    pub fn retrieve<T: DeserializeOwned>(&self, reference: SystemTime) -> Option<T> {
        let bytes = self.retrieve_raw(reference)?;
        match serde_json::from_slice(&bytes) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::debug!(path = %self.path.display(), error = %e, "corrupt cache entry");
                None
            }
        }
    }

    /// Write raw bytes, replacing any previous value.
    ///
    /// The payload is written to a temporary file next to the entry and
    /// renamed into place, so concurrent readers never observe a partial
    /// entry. Failures are logged and ignored.
    pub fn store_raw(&self, value: &[u8]) {
        if !self.enabled {
            return;
        }
        match write_atomic(&self.path, value) {
            Ok(()) => tracing::debug!(path = %self.path.display(), "cache stored"),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "failed to write cache entry");
            }
        }
    }

    /// Serialize and write a value, replacing any previous value.
    pub fn store<T: Serialize + ?Sized>(&self, value: &T) {
        if !self.enabled {
            return;
        }
        match serde_json::to_vec(value) {
            Ok(bytes) => self.store_raw(&bytes),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "failed to serialize cache entry");
            }
        }
    }

    /// Delete the entry. A missing entry is not an error.
    pub fn purge(&self) {
        match fs::remove_file(&self.path) {
            Ok(()) => tracing::debug!(path = %self.path.display(), "cache entry purged"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "failed to purge cache entry");
            }
        }
    }
}

/// Modification time of a file, `None` if it cannot be read.
pub(crate) fn entry_mtime(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|m| m.modified()).ok()
}

fn write_atomic(path: &Path, value: &[u8]) -> io::Result<()> {
    let dir = path
        .parent()
        .ok_or_else(|| io::Error::other("cache entry has no parent directory"))?;
    // Concurrent writers may race on directory creation; create_dir_all
    // treats an already existing directory as success.
    fs::create_dir_all(dir)?;

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(value)?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
