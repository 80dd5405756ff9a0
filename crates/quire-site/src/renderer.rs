//! Rendering pages through theme templates.
//!
//! Templates live at `<theme dir>/<name>.html.tpl`. Each one is compiled once
//! per process (and once per source change across processes, through the
//! compiled-template cache).
//!
//! Variables bound for every render:
//!
//! | Name         | Value                                   |
//! |--------------|-----------------------------------------|
//! | `site_title` | `[site] title`                          |
//! | `base_url`   | `[site] base_url`                       |
//! | `theme_url`  | public URL of the theme directory       |
//! | `theme_dir`  | filesystem path of the theme directory  |
//! | `page`       | the page being rendered                 |
//!
//! Caller-supplied extras are bound last and win over the names above.
//!
//! Template functions: `page(url)`, `directory(url[, sort[, order]])` and
//! `sort(pages, sort[, order])`. Relative URLs resolve against the rendered
//! page's directory.

use std::sync::Arc;

use quire_template::{Functions, Template, TemplateError};
use serde_json::{Map, Value};

use crate::directory::{SORT_ALPHA, SortOrder, sort_pages};
use crate::page::{FLAG_NO_THEME, Page};
use crate::site::lock;
use crate::url::resolve_relative;
use crate::{Site, SiteError};

const TEMPLATE_EXT: &str = "html.tpl";

impl Site {
    /// Render a processed page with its template.
    ///
    /// Pages flagged `no-theme` bypass the template and return their content.
    ///
    /// # Errors
    ///
    /// [`SiteError::NotFound`] if the template does not exist,
    /// [`SiteError::Template`] if it fails to compile or run.
    pub fn render(&self, page: &Page, extra: Map<String, Value>) -> Result<String, SiteError> {
        if page.has_flag(FLAG_NO_THEME) {
            return Ok(page.content.clone().unwrap_or_default());
        }

        let mut vars = self.globals();
        vars.insert("page".to_owned(), to_value(page)?);
        vars.extend(extra);

        let mut name = page.template.clone();
        for ext in self.extensions().iter() {
            ext.before_render(&mut vars, &mut name);
        }

        let template = self.template(&name)?;
        let functions = SiteFunctions { site: self, page };
        let mut output = template.render(&vars, &functions)?;

        for ext in self.extensions().iter() {
            ext.after_render(&mut output);
        }
        tracing::debug!(url = %page.url, template = %name, "rendered page");
        Ok(output)
    }

    /// Compiled theme template by name.
    ///
    /// Names may contain ASCII letters, digits, `-` and `_`.
    ///
    /// # Errors
    ///
    /// [`SiteError::NotFound`] for invalid names and missing files,
    /// [`SiteError::Template`] if compilation fails.
    pub fn template(&self, name: &str) -> Result<Arc<Template>, SiteError> {
        let valid = !name.is_empty()
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(SiteError::NotFound(format!("template `{name}`")));
        }

        if let Some(template) = lock(&self.templates).get(name) {
            return Ok(Arc::clone(template));
        }

        let path = self
            .config()
            .theme_resolved
            .dir
            .join(format!("{name}.{TEMPLATE_EXT}"));
        if !path.is_file() {
            return Err(SiteError::NotFound(path.display().to_string()));
        }

        let template = Arc::new(Template::load(&path, self.cache_config())?);
        lock(&self.templates).insert(name.to_owned(), Arc::clone(&template));
        Ok(template)
    }

    fn globals(&self) -> Map<String, Value> {
        let config = self.config();
        let mut vars = Map::new();
        vars.insert("site_title".to_owned(), Value::String(config.site.title.clone()));
        vars.insert("base_url".to_owned(), Value::String(config.site.base_url.clone()));
        vars.insert(
            "theme_url".to_owned(),
            Value::String(config.theme_resolved.base_url.clone()),
        );
        vars.insert(
            "theme_dir".to_owned(),
            Value::String(config.theme_resolved.dir.display().to_string()),
        );
        vars
    }
}

/// Template functions bound to the page being rendered.
struct SiteFunctions<'a> {
    site: &'a Site,
    page: &'a Page,
}

impl Functions for SiteFunctions<'_> {
    fn call(&self, name: &str, args: &[Value]) -> Option<Result<Value, TemplateError>> {
        let result = match name {
            "page" => self.page_fn(args),
            "directory" => self.directory_fn(args),
            "sort" => self.sort_fn(args),
            _ => return None,
        };
        Some(result)
    }
}

impl SiteFunctions<'_> {
    /// `page(url)`: the processed page, or `null` if it does not exist.
    fn page_fn(&self, args: &[Value]) -> Result<Value, TemplateError> {
        let [url] = args else {
            return Err(arity("page", "1", args.len()));
        };
        let url = resolve_relative(&self.page.directory_url, string_arg("page", url)?);
        match self.site.page(&url) {
            Ok(page) => to_value(&*page).map_err(render_error),
            Err(SiteError::NotFound(_)) => Ok(Value::Null),
            Err(e) => Err(render_error(e)),
        }
    }

    /// `directory(url[, sort[, order]])`: sorted header-only pages, empty if
    /// the directory does not exist.
    fn directory_fn(&self, args: &[Value]) -> Result<Value, TemplateError> {
        let (url, rest) = match args {
            [url, rest @ ..] if rest.len() <= 2 => (string_arg("directory", url)?, rest),
            _ => return Err(arity("directory", "1 to 3", args.len())),
        };
        let (sort, order) = sort_args("directory", rest)?;

        let url = resolve_relative(&self.page.directory_url, url);
        match self.site.directory(&url) {
            Ok(directory) => {
                to_value(&self.site.sort(&directory, sort, order)).map_err(render_error)
            }
            Err(SiteError::NotFound(_)) => Ok(Value::Array(Vec::new())),
            Err(e) => Err(render_error(e)),
        }
    }

    /// `sort(pages, sort[, order])`: re-sort a page list.
    fn sort_fn(&self, args: &[Value]) -> Result<Value, TemplateError> {
        let (pages, rest) = match args {
            [pages, rest @ ..] if (1..=2).contains(&rest.len()) => (pages, rest),
            _ => return Err(arity("sort", "2 to 3", args.len())),
        };
        let (sort, order) = sort_args("sort", rest)?;

        let mut pages: Vec<Page> = serde_json::from_value(pages.clone()).map_err(|e| {
            TemplateError::Runtime(format!("`sort` expects a list of pages: {e}"))
        })?;
        sort_pages(&mut pages, sort, order, self.site.extensions());
        to_value(&pages).map_err(render_error)
    }
}

fn sort_args<'a>(func: &str, args: &'a [Value]) -> Result<(&'a str, SortOrder), TemplateError> {
    let sort = match args.first() {
        Some(sort) => string_arg(func, sort)?,
        None => SORT_ALPHA,
    };
    let order = match args.get(1) {
        Some(order) => {
            let order = string_arg(func, order)?;
            SortOrder::parse(order).ok_or_else(|| {
                TemplateError::Runtime(format!("`{func}`: unknown sort order `{order}`"))
            })?
        }
        None => SortOrder::Asc,
    };
    Ok((sort, order))
}

fn string_arg<'a>(func: &str, value: &'a Value) -> Result<&'a str, TemplateError> {
    value
        .as_str()
        .ok_or_else(|| TemplateError::Runtime(format!("`{func}` expects a string, got {value}")))
}

fn arity(func: &str, expected: &str, got: usize) -> TemplateError {
    TemplateError::Runtime(format!("`{func}` takes {expected} arguments, got {got}"))
}

fn render_error(e: impl std::fmt::Display) -> TemplateError {
    TemplateError::Runtime(e.to_string())
}

fn to_value<T: serde::Serialize + ?Sized>(value: &T) -> Result<Value, SiteError> {
    serde_json::to_value(value)
        .map_err(|e| SiteError::Template(TemplateError::Runtime(e.to_string())))
}
