//! The site context.
//!
//! [`Site`] owns everything a resolution needs: the loaded configuration,
//! the active extensions, the header fields they registered and per-process
//! memo maps. It is passed by reference through the whole pipeline; nothing
//! is global.
//!
//! # Resolution
//!
//! A page is built in two phases, each backed by its own [`FileCache`] entry
//! keyed by the source file:
//!
//! 1. header phase (`header`): header fields with defaults, no content
//! 2. content phase (`page`): placeholders, Markdown, content hooks
//!
//! Pages flagged `no-cache` skip both the content cache and the memo, so
//! every call re-reads the source file.
//!
//! Directory listings run only the header phase for each child and are
//! cached as a whole against the directory's own modification time. Editing
//! a child's header without adding or removing a file leaves the cached
//! listing in place until the directory itself changes.
//!
//! # Thread Safety
//!
//! Memo maps sit behind `Mutex`es that are never held across I/O, so a
//! shared `Site` can resolve pages from several threads at once. Two threads
//! resolving the same cold page may both build it; the results are equal.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use quire_cache::{CacheConfig, FileCache};
use quire_config::Config;
use quire_template::Template;
use serde_json::{Map, Value};

use crate::directory::{Directory, SortOrder};
use crate::error::SiteError;
use crate::extension::Extensions;
use crate::page::{FLAG_NO_CACHE, FLAG_NO_DIRECTORY, FLAG_NO_MARKDOWN, Page, Placeholders};
use crate::url::{self, INDEX_FILE};
use crate::{header, markdown};

const CACHE_HEADER: &str = "header";
const CACHE_PAGE: &str = "page";
const CACHE_DIRECTORY: &str = "directory";

/// Site context shared by every resolution and render.
pub struct Site {
    config: Config,
    extensions: Extensions,
    header_defaults: Map<String, Value>,
    pages: Mutex<HashMap<PathBuf, Arc<Page>>>,
    directories: Mutex<HashMap<PathBuf, Arc<Directory>>>,
    pub(crate) templates: Mutex<HashMap<String, Arc<Template>>>,
}

impl Site {
    /// Create the context.
    ///
    /// Collects extra header fields from every extension and, when caching
    /// is enabled, wipes a cache tree written by a different build.
    #[must_use]
    pub fn new(config: Config, extensions: Extensions) -> Self {
        let mut header_defaults = Map::new();
        for ext in extensions.iter() {
            ext.header_defaults(&mut header_defaults);
        }

        let cache = &config.cache_resolved;
        if cache.enabled {
            quire_cache::validate_version(&cache.dir, env!("CARGO_PKG_VERSION"));
        }

        tracing::debug!(
            content_dir = %config.content_resolved.dir.display(),
            extensions = ?extensions,
            "site created"
        );

        Self {
            config,
            extensions,
            header_defaults,
            pages: Mutex::new(HashMap::new()),
            directories: Mutex::new(HashMap::new()),
            templates: Mutex::new(HashMap::new()),
        }
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    #[must_use]
    pub fn extensions(&self) -> &Extensions {
        &self.extensions
    }

    #[must_use]
    pub fn cache_config(&self) -> &CacheConfig {
        &self.config.cache_resolved
    }

    #[must_use]
    pub fn content_dir(&self) -> &Path {
        &self.config.content_resolved.dir
    }

    /// Source file for `url`, `None` if the URL escapes the content directory.
    #[must_use]
    pub fn url_to_file(&self, url: &str) -> Option<PathBuf> {
        url::url_to_file(self.content_dir(), url)
    }

    /// URL of a source file under the content directory.
    #[must_use]
    pub fn file_to_url(&self, file: &Path) -> Option<String> {
        url::file_to_url(self.content_dir(), file)
    }

    /// Resolve a site URL (without base URL) to a fully processed page.
    ///
    /// # Errors
    ///
    /// [`SiteError::NotFound`] if no source file backs the URL.
    pub fn page(&self, url: &str) -> Result<Arc<Page>, SiteError> {
        let file = self
            .url_to_file(url)
            .ok_or_else(|| SiteError::NotFound(url.to_owned()))?;
        self.page_from_file(&file)
    }

    /// Resolve a source file to a fully processed page.
    ///
    /// # Errors
    ///
    /// [`SiteError::NotFound`] if the file is missing or outside the content
    /// directory, [`SiteError::Io`] if it cannot be read.
    pub fn page_from_file(&self, file: &Path) -> Result<Arc<Page>, SiteError> {
        if let Some(page) = lock(&self.pages).get(file) {
            return Ok(Arc::clone(page));
        }
        if !file.is_file() {
            return Err(SiteError::NotFound(file.display().to_string()));
        }

        let header = self.page_header(file)?;
        let page = if header.has_flag(FLAG_NO_CACHE) {
            tracing::debug!(file = %file.display(), "no-cache page, rebuilding");
            let source = read_source(file)?;
            let header = self.build_header(file, &source)?;
            self.build_content(header, &source)
        } else {
            let entry = FileCache::open(file, CACHE_PAGE, self.cache_config());
            if let Some(page) = entry.retrieve::<Page>() {
                tracing::debug!(file = %file.display(), "page cache hit");
                page
            } else {
                let source = read_source(file)?;
                let page = self.build_content(header, &source);
                entry.store(&page);
                page
            }
        };

        let page = Arc::new(page);
        if !page.has_flag(FLAG_NO_CACHE) {
            lock(&self.pages).insert(file.to_path_buf(), Arc::clone(&page));
        }
        Ok(page)
    }

    /// Run the header phase for a source file. The result has no content.
    ///
    /// # Errors
    ///
    /// [`SiteError::NotFound`] if the file is missing or outside the content
    /// directory, [`SiteError::Io`] if it cannot be read.
    pub fn page_header(&self, file: &Path) -> Result<Page, SiteError> {
        let entry = FileCache::open(file, CACHE_HEADER, self.cache_config());
        if let Some(page) = entry.retrieve::<Page>() {
            return Ok(page);
        }

        let source = read_source(file)?;
        let page = self.build_header(file, &source)?;
        entry.store(&page);
        Ok(page)
    }

    /// Run the content phase on an in-memory page. Nothing is cached.
    ///
    /// The page's current `content` is treated as the raw body.
    #[must_use]
    pub fn process_virtual(&self, mut page: Page) -> Page {
        self.process_content(&mut page);
        page
    }

    /// Listing of the directory a URL names.
    ///
    /// `/blog/` and `/blog/post` both list `blog/`.
    ///
    /// # Errors
    ///
    /// [`SiteError::NotFound`] if the directory does not exist.
    pub fn directory(&self, url: &str) -> Result<Arc<Directory>, SiteError> {
        let dir = url::url_to_dir(self.content_dir(), url)
            .ok_or_else(|| SiteError::NotFound(url.to_owned()))?;
        self.directory_from_path(&dir)
    }

    /// Listing of a directory under the content directory.
    ///
    /// # Errors
    ///
    /// [`SiteError::NotFound`] if the directory does not exist,
    /// [`SiteError::Io`] if it cannot be listed.
    pub fn directory_from_path(&self, dir: &Path) -> Result<Arc<Directory>, SiteError> {
        if let Some(directory) = lock(&self.directories).get(dir) {
            return Ok(Arc::clone(directory));
        }
        if !dir.is_dir() {
            return Err(SiteError::NotFound(dir.display().to_string()));
        }

        let entry = FileCache::open(dir, CACHE_DIRECTORY, self.cache_config());
        let directory = if let Some(directory) = entry.retrieve::<Directory>() {
            tracing::debug!(dir = %dir.display(), "directory cache hit");
            directory
        } else {
            let mut directory = self.scan_directory(dir)?;
            for ext in self.extensions.iter() {
                ext.directory_complete(&mut directory);
            }
            entry.store(&directory);
            directory
        };

        let directory = Arc::new(directory);
        lock(&self.directories).insert(dir.to_path_buf(), Arc::clone(&directory));
        Ok(directory)
    }

    /// Sorted copy of a listing, with this site's extensions.
    #[must_use]
    pub fn sort(&self, directory: &Directory, sort: &str, order: SortOrder) -> Vec<Page> {
        directory.sort(sort, order, &self.extensions)
    }

    /// Every Markdown source under the content directory, in path order.
    ///
    /// Dot-files and dot-directories are skipped.
    #[must_use]
    pub fn source_files(&self) -> Vec<PathBuf> {
        let mut files = Vec::new();
        collect_sources(self.content_dir(), &mut files);
        files.sort();
        files
    }

    fn build_header(&self, file: &Path, source: &str) -> Result<Page, SiteError> {
        let not_found = || SiteError::NotFound(file.display().to_string());
        let url = self.file_to_url(file).ok_or_else(not_found)?;
        let directory_url = file
            .parent()
            .and_then(|dir| url::dir_to_url(self.content_dir(), dir))
            .ok_or_else(not_found)?;

        let raw = header::parse(source, &self.config.content_resolved.header);
        let mut page = Page::from_header(
            Some(file.to_path_buf()),
            url,
            directory_url,
            &raw,
            &self.header_defaults,
        );
        for ext in self.extensions.iter() {
            ext.after_header(&mut page);
        }
        Ok(page)
    }

    fn build_content(&self, mut page: Page, source: &str) -> Page {
        let body = source.get(page.header_end..).unwrap_or_default().trim();
        page.content = Some(body.to_owned());
        self.process_content(&mut page);
        page
    }

    fn process_content(&self, page: &mut Page) {
        for ext in self.extensions.iter() {
            ext.before_content(page);
        }

        let base_url = &self.config.site.base_url;
        let self_url = format!("{base_url}{}", page.url);
        let dir_url = format!("{base_url}{}", page.directory_url);
        let placeholders = Placeholders {
            self_url: &self_url,
            dir_url: &dir_url,
            theme_url: &self.config.theme_resolved.base_url,
            base_url,
        };

        let body = placeholders.apply(page.content.as_deref().unwrap_or_default());
        page.content = Some(if page.has_flag(FLAG_NO_MARKDOWN) {
            body
        } else {
            markdown::render(&body)
        });

        for ext in self.extensions.iter() {
            ext.after_content(page);
        }
    }

    fn scan_directory(&self, dir: &Path) -> Result<Directory, SiteError> {
        let url = url::dir_to_url(self.content_dir(), dir)
            .ok_or_else(|| SiteError::NotFound(dir.display().to_string()))?;

        let mut entries: Vec<_> = fs::read_dir(dir)
            .map_err(|e| SiteError::io(dir, e))?
            .filter_map(Result::ok)
            .collect();
        entries.sort_by_key(fs::DirEntry::file_name);

        let mut pages = Vec::new();
        for entry in entries {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if name.starts_with('.') {
                continue;
            }

            let path = entry.path();
            let file = if entry.file_type().is_ok_and(|t| t.is_dir()) {
                let index = path.join(INDEX_FILE);
                if !index.is_file() {
                    continue;
                }
                index
            } else if name.ends_with(".md") {
                path
            } else {
                continue;
            };

            match self.page_header(&file) {
                Ok(page) if page.has_flag(FLAG_NO_DIRECTORY) => {}
                Ok(page) => pages.push(page),
                Err(e) => {
                    tracing::warn!(file = %file.display(), error = %e, "skipping unreadable page");
                }
            }
        }

        tracing::debug!(dir = %dir.display(), pages = pages.len(), "scanned directory");
        Ok(Directory {
            file: Some(dir.to_path_buf()),
            url,
            pages,
        })
    }
}

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Read a source file, replacing invalid UTF-8.
fn read_source(file: &Path) -> Result<String, SiteError> {
    let bytes = fs::read(file).map_err(|e| SiteError::io(file, e))?;
    Ok(match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
    })
}

fn collect_sources(dir: &Path, files: &mut Vec<PathBuf>) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };

    for entry in entries.filter_map(Result::ok) {
        if entry.file_name().to_string_lossy().starts_with('.') {
            continue;
        }
        let path = entry.path();
        if entry.file_type().is_ok_and(|t| t.is_dir()) {
            collect_sources(&path, files);
        } else if path.extension().is_some_and(|ext| ext == "md") {
            files.push(path);
        }
    }
}

#[cfg(test)]
mod tests {
    static_assertions::assert_impl_all!(super::Site: Send, Sync);

    use std::fs::File;
    use std::time::{Duration, SystemTime};

    use pretty_assertions::assert_eq;
    use serde_json::json;
    use tempfile::TempDir;

    use super::*;
    use crate::{Extension, VirtualPage};

    fn write(root: &Path, rel: &str, content: &str) -> PathBuf {
        let path = root.join("content").join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, content).unwrap();
        path
    }

    /// Backdate `path` so cache entries written now are fresh.
    fn backdate(path: &Path) {
        let past = SystemTime::now() - Duration::from_secs(60);
        File::open(path).unwrap().set_modified(past)
            .unwrap();
    }

    fn site_with(root: &Path, extensions: Extensions) -> Site {
        fs::create_dir_all(root.join("content")).unwrap();
        Site::new(Config::default_with_base(root), extensions)
    }

    fn site(root: &Path) -> Site {
        site_with(root, Extensions::new())
    }

    // ========================================================================
    // Header phase
    // ========================================================================

    #[test]
    fn test_page_without_header_has_defaults() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "plain.md", "# Plain\n");

        let page = site(tmp.path()).page("/plain").unwrap();

        assert_eq!(page.url, "/plain");
        assert_eq!(page.directory_url, "/");
        assert_eq!(page.title, "");
        assert_eq!(page.description, "");
        assert_eq!(page.robots, "");
        assert_eq!(page.template, "index");
        assert!(page.flags.is_empty());
        assert_eq!(page.header_end, 0);
        assert_eq!(page.content.as_deref(), Some("<h1>Plain</h1>\n"));
    }

    #[test]
    fn test_header_fields_override_defaults() {
        let tmp = TempDir::new().unwrap();
        write(
            tmp.path(),
            "guide/setup.md",
            "/*\n * TITLE: Setup & Install\n * Template: doc\n * Mood: sunny\n */\nBody",
        );

        let page = site(tmp.path()).page("/guide/setup").unwrap();

        assert_eq!(page.title, "Setup &amp; Install");
        assert_eq!(page.title_raw, "Setup & Install");
        assert_eq!(page.template, "doc");
        assert_eq!(page.description, "");
        assert_eq!(page.directory_url, "/guide/");
        assert!(page.extra.is_empty());
        assert_eq!(page.content.as_deref(), Some("<p>Body</p>\n"));
    }

    #[test]
    fn test_index_page_urls() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "index.md", "Home");
        write(tmp.path(), "blog/index.md", "Blog");

        let site = site(tmp.path());
        let home = site.page("/").unwrap();
        let blog = site.page("/blog/").unwrap();

        assert_eq!(home.url, "/");
        assert_eq!(home.directory_url, "/");
        assert_eq!(blog.url, "/blog/");
        assert_eq!(blog.directory_url, "/blog/");
    }

    #[test]
    fn test_missing_page_not_found() {
        let tmp = TempDir::new().unwrap();
        let site = site(tmp.path());

        assert!(site.page("/404").unwrap_err().is_not_found());
        assert!(site.page("/../etc/passwd").unwrap_err().is_not_found());
    }

    #[test]
    fn test_header_phase_is_cached() {
        let tmp = TempDir::new().unwrap();
        let file = write(tmp.path(), "a.md", "/*\ntitle: First\n*/\n");
        backdate(&file);

        let first = site(tmp.path()).page_header(&file).unwrap();
        assert_eq!(first.title, "First");
        assert_eq!(first.content, None);

        fs::write(&file, "/*\ntitle: Second\n*/\n").unwrap();
        backdate(&file);
        let second = site(tmp.path()).page_header(&file).unwrap();
        assert_eq!(second.title, "First");
    }

    // ========================================================================
    // Content phase
    // ========================================================================

    #[test]
    fn test_content_served_from_cache() {
        let tmp = TempDir::new().unwrap();
        let file = write(tmp.path(), "a.md", "/*\ntitle: A\n*/\nfirst");
        backdate(&file);

        let first = site(tmp.path()).page("/a").unwrap();
        assert_eq!(first.content.as_deref(), Some("<p>first</p>\n"));

        // Same mtime: a fresh site must serve the cached body, not re-read.
        fs::write(&file, "/*\ntitle: A\n*/\nsecond").unwrap();
        backdate(&file);
        let second = site(tmp.path()).page("/a").unwrap();
        assert_eq!(second, first);
    }

    #[test]
    fn test_modified_file_invalidates_content() {
        let tmp = TempDir::new().unwrap();
        let file = write(tmp.path(), "a.md", "first");
        backdate(&file);
        assert_eq!(
            site(tmp.path()).page("/a").unwrap().content.as_deref(),
            Some("<p>first</p>\n")
        );

        fs::write(&file, "second").unwrap();
        let future = SystemTime::now() + Duration::from_secs(60);
        File::options()
            .write(true)
            .open(&file)
            .unwrap()
            .set_modified(future)
            .unwrap();
        assert_eq!(
            site(tmp.path()).page("/a").unwrap().content.as_deref(),
            Some("<p>second</p>\n")
        );
    }

    #[test]
    fn test_no_cache_page_is_reread_and_never_stored() {
        let tmp = TempDir::new().unwrap();
        let file = write(tmp.path(), "live.md", "/*\nflags: No-Cache\n*/\none");
        backdate(&file);
        let site = site(tmp.path());

        assert_eq!(site.page("/live").unwrap().content.as_deref(), Some("<p>one</p>\n"));

        fs::write(&file, "/*\nflags: No-Cache\n*/\ntwo").unwrap();
        backdate(&file);
        assert_eq!(site.page("/live").unwrap().content.as_deref(), Some("<p>two</p>\n"));

        let entry = FileCache::open(&file, CACHE_PAGE, site.cache_config());
        assert!(!entry.path().exists());
    }

    #[test]
    fn test_placeholders_and_no_markdown() {
        let tmp = TempDir::new().unwrap();
        write(
            tmp.path(),
            "docs/raw.md",
            "/*\nflags: no-markdown\n*/\n<a href=\"%self_url%\">%dir_url%</a> %theme_url% %base_url%",
        );
        let mut config = Config::default_with_base(tmp.path());
        config.site.base_url = "/site".to_owned();
        config.theme_resolved.base_url = "/site/themes/default".to_owned();
        let site = Site::new(config, Extensions::new());

        let page = site.page("/docs/raw").unwrap();
        assert_eq!(
            page.content.as_deref(),
            Some("<a href=\"/site/docs/raw\">/site/docs/</a> /site/themes/default /site")
        );
    }

    #[test]
    fn test_memo_returns_same_instance() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "a.md", "a");
        let site = site(tmp.path());

        let first = site.page("/a").unwrap();
        let second = site.page("/a").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_cache_disabled_writes_nothing() {
        let tmp = TempDir::new().unwrap();
        let file = write(tmp.path(), "a.md", "a");
        let mut config = Config::default_with_base(tmp.path());
        config.cache_resolved = CacheConfig::disabled();
        let site = Site::new(config, Extensions::new());

        site.page("/a").unwrap();
        assert!(!tmp.path().join("cache").exists());
        assert!(!FileCache::open(&file, CACHE_HEADER, site.cache_config()).is_valid());
    }

    #[test]
    fn test_process_virtual() {
        let tmp = TempDir::new().unwrap();
        let site = site(tmp.path());

        let page = VirtualPage::new("/tags/rust")
            .title("Rust")
            .content("See [%dir_url%](%self_url%)")
            .build();
        let page = site.process_virtual(page);

        assert_eq!(
            page.content.as_deref(),
            Some("<p>See <a href=\"/tags/rust\">/tags/</a></p>\n")
        );
        assert!(!tmp.path().join("cache").join(CACHE_PAGE).exists());
    }

    // ========================================================================
    // Extensions
    // ========================================================================

    struct Stamp;

    impl Extension for Stamp {
        fn name(&self) -> &str {
            "stamp"
        }

        fn header_defaults(&self, defaults: &mut Map<String, Value>) {
            defaults.insert("author".to_owned(), json!("nobody"));
        }

        fn after_header(&self, page: &mut Page) {
            page.title_raw = page.title_raw.to_uppercase();
            page.escape_fields();
        }

        fn before_content(&self, page: &mut Page) {
            if let Some(body) = page.content.as_mut() {
                *body = body.replace("[[stamp]]", "**stamped**");
            }
        }

        fn after_content(&self, page: &mut Page) {
            if let Some(body) = page.content.as_mut() {
                body.push_str("<!-- stamp -->");
            }
        }

        fn directory_complete(&self, directory: &mut Directory) {
            directory.pages.retain(|p| p.title != "HIDDEN");
        }
    }

    fn stamped() -> Extensions {
        Extensions::activate(vec![Box::new(Stamp)], &["stamp".to_owned()])
    }

    #[test]
    fn test_extension_hooks_shape_page() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "a.md", "/*\ntitle: hello\nauthor: Ann\n*/\n[[stamp]]");
        write(tmp.path(), "b.md", "plain");

        let site = site_with(tmp.path(), stamped());
        let a = site.page("/a").unwrap();
        let b = site.page("/b").unwrap();

        assert_eq!(a.title, "HELLO");
        assert_eq!(a.extra.get("author"), Some(&json!("Ann")));
        assert_eq!(b.extra.get("author"), Some(&json!("nobody")));
        assert_eq!(
            a.content.as_deref(),
            Some("<p><strong>stamped</strong></p>\n<!-- stamp -->")
        );
    }

    // ========================================================================
    // Directory listing
    // ========================================================================

    #[test]
    fn test_directory_listing() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "blog/index.md", "/*\ntitle: Blog\n*/\n");
        write(tmp.path(), "blog/b.md", "/*\ntitle: Bee\n*/\nbody");
        write(tmp.path(), "blog/a.md", "/*\ntitle: Ant\n*/\nbody");
        write(tmp.path(), "blog/draft.md", "/*\ntitle: Draft\nflags: no-directory\n*/\n");
        write(tmp.path(), "blog/.hidden.md", "hidden");
        write(tmp.path(), "blog/notes.txt", "not markdown");
        write(tmp.path(), "blog/series/index.md", "/*\ntitle: Series\n*/\n");
        write(tmp.path(), "blog/series/part1.md", "/*\ntitle: Part 1\n*/\n");
        fs::create_dir_all(tmp.path().join("content/blog/empty")).unwrap();

        let site = site(tmp.path());
        let dir = site.directory("/blog/").unwrap();

        assert_eq!(dir.url, "/blog/");
        let urls: Vec<&str> = dir.pages.iter().map(|p| p.url.as_str()).collect();
        assert_eq!(urls, vec!["/blog/a", "/blog/b", "/blog/", "/blog/series/"]);
        assert!(dir.pages.iter().all(|p| p.content.is_none()));

        // A page URL lists its containing directory.
        let same = site.directory("/blog/a").unwrap();
        assert!(Arc::ptr_eq(&dir, &same));

        let titles: Vec<String> = site
            .sort(&dir, "alpha", SortOrder::Asc)
            .into_iter()
            .map(|p| p.title)
            .collect();
        assert_eq!(titles, vec!["Ant", "Bee", "Blog", "Series"]);
    }

    #[test]
    fn test_directory_complete_hook() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "a.md", "/*\ntitle: hidden\n*/\n");
        write(tmp.path(), "b.md", "/*\ntitle: shown\n*/\n");

        let site = site_with(tmp.path(), stamped());
        let dir = site.directory("/").unwrap();

        let titles: Vec<&str> = dir.pages.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["SHOWN"]);
    }

    #[test]
    fn test_directory_cached_against_directory_mtime() {
        let tmp = TempDir::new().unwrap();
        let file = write(tmp.path(), "docs/a.md", "/*\ntitle: Old\n*/\n");
        let dir = tmp.path().join("content/docs");
        backdate(&file);
        backdate(&dir);

        let first = site(tmp.path()).directory("/docs/").unwrap();
        assert_eq!(first.pages[0].title, "Old");

        // A header edit alone keeps the cached listing.
        fs::write(&file, "/*\ntitle: New\n*/\n").unwrap();
        backdate(&dir);
        let second = site(tmp.path()).directory("/docs/").unwrap();
        assert_eq!(second.pages[0].title, "Old");

        // Adding a file touches the directory and refreshes it.
        write(tmp.path(), "docs/b.md", "/*\ntitle: B\n*/\n");
        let third = site(tmp.path()).directory("/docs/").unwrap();
        let titles: Vec<&str> = third.pages.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["New", "B"]);
    }

    #[test]
    fn test_missing_directory_not_found() {
        let tmp = TempDir::new().unwrap();
        let site = site(tmp.path());
        assert!(site.directory("/nope/").unwrap_err().is_not_found());
    }

    #[test]
    fn test_source_files() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "index.md", "");
        write(tmp.path(), "b/c.md", "");
        write(tmp.path(), "a.md", "");
        write(tmp.path(), ".git/x.md", "");
        write(tmp.path(), "img.png", "");

        let site = site(tmp.path());
        let content = site.content_dir().to_path_buf();
        let files: Vec<PathBuf> = site
            .source_files()
            .into_iter()
            .map(|f| f.strip_prefix(&content).unwrap().to_path_buf())
            .collect();
        assert_eq!(
            files,
            vec![
                PathBuf::from("a.md"),
                PathBuf::from("b/c.md"),
                PathBuf::from("index.md")
            ]
        );
    }
}
