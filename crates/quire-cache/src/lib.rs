//! Mtime-gated, content-addressed file cache for Quire.
//!
//! Cache entries are files on disk whose location is derived from the hash of
//! a caller-chosen key. Freshness is decided purely by comparing an entry's
//! modification time to a caller-supplied reference time: an entry is valid
//! iff it was written *after* the reference. No expiry metadata is stored.
//!
//! - [`Cache`]: a single entry addressed by key and purpose tag
//! - [`FileCache`]: an entry whose freshness reference is the modification
//!   time of a source file, so editing the file invalidates the entry
//!
//! The cache is an optimization, never a correctness dependency. Read errors
//! (missing, truncated or corrupt entries) are misses; write errors are logged
//! and swallowed.
//!
//! # Layout
//!
//! ```text
//! {dir}/
//! +-- VERSION                       # see validate_version
//! +-- {purpose}/
//!     +-- {hash[0:2]}/
//!         +-- {hash[2:4]}/
//!             +-- {hash}.json       # structured entry
//!             +-- {hash}.raw        # raw entry
//! ```
//!
//! # Example
//!
//! ```
//! use std::time::{Duration, SystemTime};
//! use quire_cache::{Cache, CacheConfig};
//!
//! let tmp = tempfile::tempdir().unwrap();
//! let config = CacheConfig::new(tmp.path().join("cache"));
//! let entry = Cache::open("/content/about.md", "header", &config);
//!
//! let before = SystemTime::now() - Duration::from_secs(60);
//! entry.store(&vec!["About".to_owned()]);
//! let title: Option<Vec<String>> = entry.retrieve(before);
//! assert_eq!(title, Some(vec!["About".to_owned()]));
//! ```

mod entry;
mod file;
mod version;

use std::path::PathBuf;

pub use entry::Cache;
pub use file::FileCache;
pub use version::{purge_all, validate_version};

/// File extension of structured (serialized) entries.
pub const STRUCTURED_EXT: &str = "json";

/// File extension of raw entries.
pub const RAW_EXT: &str = "raw";

/// How reads treat existing entries.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CacheMode {
    /// Entries are served when fresh.
    #[default]
    Normal,
    /// Entries are written but every read reports a miss.
    Debug,
    /// Every read deletes the entry, then reports a miss.
    Purge,
}

impl CacheMode {
    /// Parse a mode name (`normal`, `debug`, `purge`), case-insensitively.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "normal" => Some(Self::Normal),
            "debug" => Some(Self::Debug),
            "purge" => Some(Self::Purge),
            _ => None,
        }
    }
}

/// Process-wide cache settings, inherited by every entry handle.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CacheConfig {
    /// Whether caching is enabled at all. Disabled caches always miss and
    /// never write.
    pub enabled: bool,
    /// Root directory of the cache tree.
    pub dir: PathBuf,
    /// Read behavior.
    pub mode: CacheMode,
}

impl CacheConfig {
    /// Enabled cache rooted at `dir` in normal mode.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            enabled: true,
            dir: dir.into(),
            mode: CacheMode::Normal,
        }
    }

    /// Disabled cache. Every read misses, every write is discarded.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            dir: PathBuf::new(),
            mode: CacheMode::Normal,
        }
    }

    /// Same settings with a different mode.
    #[must_use]
    pub fn with_mode(mut self, mode: CacheMode) -> Self {
        self.mode = mode;
        self
    }
}
