//! Cache entries bound to a source file.
//!
//! A [`FileCache`] uses the modification time of its source file as the
//! freshness reference, so any write to the source file invalidates the entry
//! on the very next read without explicit versioning.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::entry::entry_mtime;
use crate::{Cache, CacheConfig};

/// Cache entry derived from a source file.
///
/// The key is the source path plus a purpose tag, e.g. `("content/a.md",
/// "header")`.
///
/// If the source file has vanished, the freshness reference is undefined and
/// the entry is treated as absent. The caller will then fail on the missing
/// source and report it; `FileCache` itself never errors.
#[derive(Clone, Debug)]
pub struct FileCache {
    source: PathBuf,
    entry: Cache,
}

impl FileCache {
    /// Open a structured entry for `source`.
    #[must_use]
    pub fn open(source: impl Into<PathBuf>, purpose: &str, config: &CacheConfig) -> Self {
        let source = source.into();
        let entry = Cache::open(source.as_os_str().as_encoded_bytes(), purpose, config);
        Self { source, entry }
    }

    /// Open a raw entry for `source`.
    #[must_use]
    pub fn open_raw(source: impl Into<PathBuf>, purpose: &str, config: &CacheConfig) -> Self {
        let source = source.into();
        let entry = Cache::open_raw(source.as_os_str().as_encoded_bytes(), purpose, config);
        Self { source, entry }
    }

    /// The watched source file.
    #[must_use]
    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Location of the entry on disk.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.entry.path()
    }

    /// Current modification time of the source file.
    #[must_use]
    pub fn source_mtime(&self) -> Option<SystemTime> {
        entry_mtime(&self.source)
    }

    /// Whether the entry was written after the source file was last modified.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.source_mtime()
            .is_some_and(|mtime| self.entry.is_valid(mtime))
    }

    /// Raw bytes of the entry if it is fresher than the source file.
    #[must_use]
    pub fn retrieve_raw(&self) -> Option<Vec<u8>> {
        self.entry.retrieve_raw(self.source_mtime()?)
    }

    /// Raw bytes of the entry if it is fresher than an explicit reference.
    #[must_use]
    pub fn retrieve_raw_since(&self, reference: SystemTime) -> Option<Vec<u8>> {
        self.entry.retrieve_raw(reference)
    }

    /// Deserialized entry if it is fresher than the source file.
    #[must_use]
    pub fn retrieve<T: DeserializeOwned>(&self) -> Option<T> {
        self.entry.retrieve(self.source_mtime()?)
    }

    /// Deserialized entry if it is fresher than an explicit reference.
    #[must_use]
    pub fn retrieve_since<T: DeserializeOwned>(&self, reference: SystemTime) -> Option<T> {
        self.entry.retrieve(reference)
    }

    /// Write raw bytes.
    pub fn store_raw(&self, value: &[u8]) {
        self.entry.store_raw(value);
    }

    /// Serialize and write a value.
    pub fn store<T: Serialize + ?Sized>(&self, value: &T) {
        self.entry.store(value);
    }

    /// Delete the entry.
    pub fn purge(&self) {
        self.entry.purge();
    }
}

#[cfg(test)]
mod tests {
    use std::fs::{self, File};
    use std::time::Duration;

    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    use super::*;
    use crate::CacheMode;

    /// Write `content` to `path` and pin its mtime `secs_ago` seconds in the past.
    fn write_source(path: &Path, content: &str, secs_ago: u64) {
        fs::write(path, content).unwrap();
        set_mtime(path, SystemTime::now() - Duration::from_secs(secs_ago));
    }

    fn set_mtime(path: &Path, mtime: SystemTime) {
        File::options()
            .write(true)
            .open(path)
            .unwrap()
            .set_modified(mtime)
            .unwrap();
    }

    #[test]
    fn test_hit_when_source_unchanged() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("page.md");
        write_source(&source, "# Page", 60);

        let cache = FileCache::open(&source, "page", &CacheConfig::new(tmp.path().join("cache")));
        cache.store("<h1>Page</h1>");

        assert!(cache.is_valid());
        assert_eq!(cache.retrieve::<String>().unwrap(), "<h1>Page</h1>");
    }

    #[test]
    fn test_source_modification_invalidates() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("page.md");
        write_source(&source, "# Page", 60);

        let cache = FileCache::open(&source, "page", &CacheConfig::new(tmp.path().join("cache")));
        cache.store("<h1>Page</h1>");

        fs::write(&source, "# Edited").unwrap();
        set_mtime(&source, SystemTime::now() + Duration::from_secs(60));

        assert!(!cache.is_valid());
        assert_eq!(cache.retrieve::<String>(), None);
    }

    #[test]
    fn test_vanished_source_is_miss() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("page.md");
        write_source(&source, "# Page", 60);

        let cache = FileCache::open(&source, "page", &CacheConfig::new(tmp.path().join("cache")));
        cache.store("<h1>Page</h1>");
        fs::remove_file(&source).unwrap();

        assert!(!cache.is_valid());
        assert_eq!(cache.retrieve::<String>(), None);
        assert_eq!(cache.retrieve_raw(), None);
    }

    #[test]
    fn test_explicit_reference_overrides_source_mtime() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("page.md");
        write_source(&source, "# Page", 60);

        let cache =
            FileCache::open_raw(&source, "template", &CacheConfig::new(tmp.path().join("cache")));
        cache.store_raw(b"compiled");

        let future = SystemTime::now() + Duration::from_secs(60);
        assert_eq!(cache.retrieve_raw_since(future), None);
        assert_eq!(cache.retrieve_raw(), Some(b"compiled".to_vec()));
    }

    #[test]
    fn test_key_includes_source_path() {
        let tmp = TempDir::new().unwrap();
        let config = CacheConfig::new(tmp.path().join("cache"));
        let a = FileCache::open(tmp.path().join("a.md"), "page", &config);
        let b = FileCache::open(tmp.path().join("b.md"), "page", &config);
        assert_ne!(a.path(), b.path());
        assert_eq!(a.source(), tmp.path().join("a.md"));
    }

    #[test]
    fn test_debug_mode_always_stale() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("page.md");
        write_source(&source, "# Page", 60);

        let config = CacheConfig::new(tmp.path().join("cache")).with_mode(CacheMode::Debug);
        let cache = FileCache::open(&source, "page", &config);
        cache.store("value");

        assert!(cache.path().exists());
        assert_eq!(cache.retrieve::<String>(), None);
    }
}
