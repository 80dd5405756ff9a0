//! End-to-end tests: content and theme on disk, resolved through `Site`.

use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use pretty_assertions::assert_eq;
use quire_cache::{CacheMode, FileCache};
use quire_config::Config;
use quire_site::{Extension, Extensions, Page, Site, SortOrder};
use serde_json::{Map, Value};
use tempfile::TempDir;

struct Fixture {
    dir: TempDir,
}

impl Fixture {
    fn new() -> Self {
        let fixture = Self {
            dir: TempDir::new().unwrap(),
        };
        fixture.theme("index", "<h1>{{ page.title }}</h1>\n{{! page.content }}");
        fixture
    }

    fn root(&self) -> &Path {
        self.dir.path()
    }

    fn content(&self, rel: &str, text: &str) -> PathBuf {
        let path = self.root().join("content").join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, text).unwrap();
        backdate(&path);
        path
    }

    fn theme(&self, name: &str, text: &str) {
        let path = self.root().join(format!("themes/default/{name}.html.tpl"));
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, text).unwrap();
    }

    fn config(&self) -> Config {
        fs::create_dir_all(self.root().join("content")).unwrap();
        Config::from_toml(
            "[site]\ntitle = \"Test\"\n[extensions]\nenabled = [\"tags\"]\n",
            self.root(),
        )
        .unwrap()
    }

    fn site(&self) -> Site {
        Site::new(self.config(), extensions())
    }
}

fn backdate(path: &Path) {
    let past = SystemTime::now() - Duration::from_secs(60);
    File::options()
        .write(true)
        .open(path)
        .unwrap()
        .set_modified(past)
        .unwrap();
}

/// Serves `/plugin/tags/<tag>` listing every root page carrying that flag.
struct Tags;

impl Extension for Tags {
    fn name(&self) -> &str {
        "tags"
    }

    fn header_defaults(&self, defaults: &mut Map<String, Value>) {
        defaults.insert("date".to_owned(), Value::Null);
    }

    fn directory_sort(&self, sort: &str, pages: &mut Vec<Page>) {
        if sort == "date" {
            pages.sort_by(|a, b| {
                let date = |p: &Page| p.extra.get("date").and_then(Value::as_str).map(str::to_owned);
                date(a).cmp(&date(b))
            });
        }
    }

    fn url(&self, site: &Site, rest: &str) -> Option<Page> {
        let dir = site.directory("/").ok()?;
        let items: String = dir
            .pages
            .iter()
            .filter(|p| p.has_flag(rest))
            .map(|p| format!("- {}\n", p.title))
            .collect();
        if items.is_empty() {
            return None;
        }
        Some(
            quire_site::VirtualPage::new(format!("/plugin/tags/{rest}"))
                .title(format!("Tagged {rest}"))
                .content(items)
                .build(),
        )
    }
}

fn extensions() -> Extensions {
    Extensions::activate(vec![Box::new(Tags)], &["tags".to_owned()])
}

#[test]
fn test_resolve_and_render_page() {
    let fx = Fixture::new();
    fx.content(
        "guide.md",
        "/*\n * Title: Guide\n * Description: How to\n */\nRead [this](%dir_url%next).\n",
    );
    let site = fx.site();

    let page = site.page("/guide").unwrap();
    assert_eq!(page.title, "Guide");
    assert_eq!(page.description, "How to");
    assert_eq!(page.extra.get("date"), Some(&Value::Null));

    let html = site.render(&page, Map::new()).unwrap();
    assert_eq!(html, "<h1>Guide</h1>\n<p>Read <a href=\"/next\">this</a>.</p>\n");
}

#[test]
fn test_second_site_serves_cached_content() {
    let fx = Fixture::new();
    let file = fx.content("a.md", "first body");

    let first = fx.site().page("/a").unwrap();

    fs::write(&file, "second body").unwrap();
    backdate(&file);
    let second = fx.site().page("/a").unwrap();
    assert_eq!(second.content, first.content);
    assert_eq!(second.content.as_deref(), Some("<p>first body</p>\n"));
}

#[test]
fn test_debug_mode_never_serves_cache() {
    let fx = Fixture::new();
    let file = fx.content("a.md", "first body");
    fx.site().page("/a").unwrap();

    fs::write(&file, "second body").unwrap();
    backdate(&file);
    let mut config = fx.config();
    config.cache_resolved.mode = CacheMode::Debug;
    let site = Site::new(config, extensions());

    let page = site.page("/a").unwrap();
    assert_eq!(page.content.as_deref(), Some("<p>second body</p>\n"));
}

#[test]
fn test_purge_mode_replaces_entries() {
    let fx = Fixture::new();
    let file = fx.content("a.md", "first body");
    fx.site().page("/a").unwrap();

    fs::write(&file, "second body").unwrap();
    backdate(&file);
    let mut config = fx.config();
    config.cache_resolved.mode = CacheMode::Purge;
    let page = Site::new(config, extensions()).page("/a").unwrap();
    assert_eq!(page.content.as_deref(), Some("<p>second body</p>\n"));

    // The purged entry was rebuilt from the new source.
    let page = fx.site().page("/a").unwrap();
    assert_eq!(page.content.as_deref(), Some("<p>second body</p>\n"));
}

#[test]
fn test_listing_sort_and_exclusion() {
    let fx = Fixture::new();
    fx.content("banana.md", "/*\ntitle: Banana\ndate: 2024-03-01\n*/\n");
    fx.content("apple.md", "/*\ntitle: Apple\ndate: 2024-01-01\n*/\n");
    fx.content("cherry.md", "/*\ntitle: Cherry\ndate: 2024-02-01\n*/\n");
    fx.content("secret.md", "/*\ntitle: Secret\nflags: no-directory\n*/\n");
    let site = fx.site();

    let dir = site.directory("/").unwrap();
    let titles = |pages: Vec<Page>| pages.into_iter().map(|p| p.title).collect::<Vec<_>>();

    assert_eq!(
        titles(site.sort(&dir, "alpha", SortOrder::Asc)),
        vec!["Apple", "Banana", "Cherry"]
    );
    assert_eq!(
        titles(site.sort(&dir, "alpha", SortOrder::Desc)),
        vec!["Cherry", "Banana", "Apple"]
    );
    assert_eq!(
        titles(site.sort(&dir, "date", SortOrder::Desc)),
        vec!["Banana", "Cherry", "Apple"]
    );

    // The excluded page still resolves by URL.
    assert_eq!(site.page("/secret").unwrap().title, "Secret");
}

#[test]
fn test_missing_404_is_not_found() {
    let fx = Fixture::new();
    let site = fx.site();
    assert!(site.page("/404").unwrap_err().is_not_found());

    let response = site.respond("/nothing-here").unwrap();
    assert_eq!(response.status, 404);
    assert!(response.body.starts_with("<h1>Not Found</h1>"));
    assert!(response.body.contains("/nothing-here"));
}

#[test]
fn test_no_cache_page_rereads_source() {
    let fx = Fixture::new();
    let file = fx.content("clock.md", "/*\nflags: no-cache\n*/\ntick");
    let site = fx.site();

    let first = site.page("/clock").unwrap();
    fs::write(&file, "/*\nflags: no-cache\n*/\ntock").unwrap();
    backdate(&file);
    let second = site.page("/clock").unwrap();

    assert!(!Arc::ptr_eq(&first, &second));
    assert_eq!(first.content.as_deref(), Some("<p>tick</p>\n"));
    assert_eq!(second.content.as_deref(), Some("<p>tock</p>\n"));
    assert!(!FileCache::open(&file, "page", site.cache_config()).path().exists());
}

#[test]
fn test_plugin_page_through_respond() {
    let fx = Fixture::new();
    fx.content("one.md", "/*\ntitle: One\nflags: rust\n*/\n");
    fx.content("two.md", "/*\ntitle: Two\n*/\n");
    fx.content("three.md", "/*\ntitle: Three\nflags: rust, no-directory\n*/\n");
    let site = fx.site();

    let response = site.respond("/plugin/tags/rust").unwrap();
    assert_eq!(response.status, 200);
    assert_eq!(
        response.body,
        "<h1>Tagged rust</h1>\n<ul>\n<li>One</li>\n</ul>\n"
    );
    assert_eq!(site.respond("/plugin/tags/go").unwrap().status, 404);
}

#[test]
fn test_template_lists_directory() {
    let fx = Fixture::new();
    fx.theme(
        "list",
        "{% for p in directory(\"/posts/\") { %}<a href=\"{{ base_url }}{{ p.url }}\">{{ p.title }}</a>\n{% } %}",
    );
    fx.content("posts/index.md", "/*\ntitle: Posts\ntemplate: list\n*/\n");
    fx.content("posts/b.md", "/*\ntitle: B & co\n*/\n");
    fx.content("posts/a.md", "/*\ntitle: A\n*/\n");
    let site = fx.site();

    let response = site.respond("/posts/").unwrap();
    assert_eq!(
        response.body,
        "<a href=\"/posts/a\">A</a>\n<a href=\"/posts/b\">B &amp;amp; co</a>\n<a href=\"/posts/\">Posts</a>\n"
    );
}

#[test]
fn test_compiled_template_is_cached_on_disk() {
    let fx = Fixture::new();
    fx.content("a.md", "/*\ntitle: A\n*/\n");
    let path = fx.root().join("themes/default/index.html.tpl");
    backdate(&path);

    let site = fx.site();
    let page = site.page("/a").unwrap();
    let expected = site.render(&page, Map::new()).unwrap();
    assert_eq!(expected, "<h1>A</h1>\n");

    // Same mtime, broken source: the cached script is still used.
    fs::write(&path, "{{ oops").unwrap();
    backdate(&path);
    let site = fx.site();
    assert_eq!(site.render(&page, Map::new()).unwrap(), expected);

    let entry = FileCache::open_raw(&path, "template", site.cache_config());
    assert!(entry.is_valid());
}
