//! Page entities.
//!
//! A [`Page`] is built in two phases. The header phase fills every header
//! field (with defaults when the file has no header block) and leaves
//! `content` unset. The content phase adds the rendered body. Both phases are
//! cached independently by [`Site`](crate::Site).

use std::path::PathBuf;

use quire_template::escape_html;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::header::{RawHeader, parse_flags};

/// Skip the content-phase cache for this page.
pub const FLAG_NO_CACHE: &str = "no-cache";
/// Return the content without running it through the theme.
pub const FLAG_NO_THEME: &str = "no-theme";
/// Treat the body as HTML, skip Markdown.
pub const FLAG_NO_MARKDOWN: &str = "no-markdown";
/// Leave the page out of directory listings.
pub const FLAG_NO_DIRECTORY: &str = "no-directory";

/// Template used when the header does not name one.
pub const DEFAULT_TEMPLATE: &str = "index";

/// A resolved page.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Page {
    /// Source file, `None` for virtual pages.
    pub file: Option<PathBuf>,
    /// Site URL, without the base URL.
    pub url: String,
    /// URL of the directory containing the page, with trailing slash.
    pub directory_url: String,
    /// HTML-escaped title.
    pub title: String,
    pub title_raw: String,
    /// HTML-escaped description.
    pub description: String,
    pub description_raw: String,
    /// HTML-escaped robots directive.
    pub robots: String,
    pub robots_raw: String,
    /// Theme template name.
    pub template: String,
    /// Lower-cased flags in header order.
    pub flags: Vec<String>,
    /// Extension-defined header fields.
    pub extra: Map<String, Value>,
    /// Rendered body, set by the content phase.
    pub content: Option<String>,
    /// Byte offset in the source file where the body starts.
    pub header_end: usize,
}

impl Page {
    /// Build the header-phase page from a parsed header block.
    ///
    /// `extra_defaults` holds extension-registered fields; a header line with
    /// the same key overrides the default.
    pub(crate) fn from_header(
        file: Option<PathBuf>,
        url: String,
        directory_url: String,
        header: &RawHeader,
        extra_defaults: &Map<String, Value>,
    ) -> Self {
        let field = |key: &str| header.get(key).unwrap_or_default().to_owned();

        let extra = extra_defaults
            .iter()
            .map(|(key, default)| {
                let value = header
                    .get(key)
                    .map_or_else(|| default.clone(), |v| Value::String(v.to_owned()));
                (key.clone(), value)
            })
            .collect();

        let mut page = Self {
            file,
            url,
            directory_url,
            title: String::new(),
            title_raw: field("title"),
            description: String::new(),
            description_raw: field("description"),
            robots: String::new(),
            robots_raw: field("robots"),
            template: header
                .get("template")
                .filter(|t| !t.is_empty())
                .unwrap_or(DEFAULT_TEMPLATE)
                .to_owned(),
            flags: parse_flags(header.get("flags").unwrap_or_default()),
            extra,
            content: None,
            header_end: header.end,
        };
        page.escape_fields();
        page
    }

    /// Recompute the escaped header fields from their raw values.
    pub fn escape_fields(&mut self) {
        self.title = escape_html(&self.title_raw);
        self.description = escape_html(&self.description_raw);
        self.robots = escape_html(&self.robots_raw);
    }

    /// Whether the page carries `flag`.
    #[must_use]
    pub fn has_flag(&self, flag: &str) -> bool {
        self.flags.iter().any(|f| f == flag)
    }

    /// Whether the page has no backing file.
    #[must_use]
    pub fn is_virtual(&self) -> bool {
        self.file.is_none()
    }
}

/// URLs substituted into page bodies before Markdown runs.
pub(crate) struct Placeholders<'a> {
    pub self_url: &'a str,
    pub dir_url: &'a str,
    pub theme_url: &'a str,
    pub base_url: &'a str,
}

impl Placeholders<'_> {
    /// Replace `%self_url%`, `%dir_url%`, `%theme_url%`, `%base_url%` in that order.
    pub(crate) fn apply(&self, body: &str) -> String {
        body.replace("%self_url%", self.self_url)
            .replace("%dir_url%", self.dir_url)
            .replace("%theme_url%", self.theme_url)
            .replace("%base_url%", self.base_url)
    }
}

/// Builder for pages that exist only in memory.
///
/// Virtual pages go through the content phase via
/// [`Site::process_virtual`](crate::Site::process_virtual) but are never
/// cached.
///
/// # Example
///
/// ```
/// use quire_site::VirtualPage;
///
/// let page = VirtualPage::new("/gallery/")
///     .title("Gallery")
///     .content("<ul></ul>")
///     .flag("no-markdown")
///     .build();
/// assert!(page.is_virtual());
/// assert_eq!(page.title, "Gallery");
/// ```
#[derive(Debug, Clone)]
pub struct VirtualPage {
    url: String,
    title: String,
    description: String,
    robots: String,
    template: String,
    flags: Vec<String>,
    extra: Map<String, Value>,
    content: String,
}

impl VirtualPage {
    /// Start a virtual page for `url` with default header fields.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: String::new(),
            description: String::new(),
            robots: String::new(),
            template: DEFAULT_TEMPLATE.to_owned(),
            flags: Vec::new(),
            extra: Map::new(),
            content: String::new(),
        }
    }

    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    #[must_use]
    pub fn robots(mut self, robots: impl Into<String>) -> Self {
        self.robots = robots.into();
        self
    }

    #[must_use]
    pub fn template(mut self, template: impl Into<String>) -> Self {
        self.template = template.into();
        self
    }

    /// Add a flag; it is lower-cased like header flags.
    #[must_use]
    pub fn flag(mut self, flag: &str) -> Self {
        self.flags.push(flag.trim().to_lowercase());
        self
    }

    #[must_use]
    pub fn extra(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    /// Raw body, processed like a file body by the content phase.
    #[must_use]
    pub fn content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    /// Finish the page. Its content is the raw body until processed.
    #[must_use]
    pub fn build(self) -> Page {
        let directory_url = match self.url.rfind('/') {
            Some(i) => self.url[..=i].to_owned(),
            None => "/".to_owned(),
        };
        let mut page = Page {
            file: None,
            url: self.url,
            directory_url,
            title: String::new(),
            title_raw: self.title,
            description: String::new(),
            description_raw: self.description,
            robots: String::new(),
            robots_raw: self.robots,
            template: self.template,
            flags: self.flags,
            extra: self.extra,
            content: Some(self.content),
            header_end: 0,
        };
        page.escape_fields();
        page
    }
}
