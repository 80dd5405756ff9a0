//! Request dispatch.
//!
//! Turns a request URL into a [`Response`]:
//!
//! 1. drop the query string and fragment
//! 2. redirect `.../index` to `.../`
//! 3. strip the site base URL and run `request_url` hooks
//! 4. serve `/plugin/<name>/<rest>` from the named extension, any other URL
//!    from the content directory
//! 5. on a miss, render `/404` (or a built-in page) with status 404

use std::sync::Arc;

use quire_template::escape_html;
use serde_json::{Map, Value};

use crate::page::{FLAG_NO_MARKDOWN, Page, VirtualPage};
use crate::{Site, SiteError};

const PLUGIN_PREFIX: &str = "/plugin/";
const NOT_FOUND_URL: &str = "/404";

/// Rendered response for one request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Response {
    /// HTTP status code.
    pub status: u16,
    pub body: String,
    /// Redirect target for 3xx responses.
    pub location: Option<String>,
}

impl Response {
    fn ok(body: String) -> Self {
        Self {
            status: 200,
            body,
            location: None,
        }
    }

    fn redirect(location: &str) -> Self {
        Self {
            status: 302,
            body: String::new(),
            location: Some(location.to_owned()),
        }
    }
}

impl Site {
    /// Resolve and render a request URL.
    ///
    /// A missing page is not an error: it produces a 404 response.
    ///
    /// # Errors
    ///
    /// Template failures, unreadable sources and a missing theme template.
    pub fn respond(&self, request_url: &str) -> Result<Response, SiteError> {
        let path = request_url.split(['?', '#']).next().unwrap_or_default();
        if let Some(dir) = path.strip_suffix("index")
            && dir.ends_with('/')
        {
            tracing::debug!(from = path, to = dir, "redirecting index URL");
            return Ok(Response::redirect(dir));
        }

        let mut url = self.strip_base_url(path);
        for ext in self.extensions().iter() {
            ext.request_url(&mut url);
        }

        match self.resolve_request(&url) {
            Ok(page) => Ok(Response::ok(self.render(&page, Map::new())?)),
            Err(e) if e.is_not_found() => self.not_found(&url),
            Err(e) => Err(e),
        }
    }

    fn strip_base_url(&self, path: &str) -> String {
        let base_url = self.config().site.base_url.as_str();
        let rest = match path.strip_prefix(base_url) {
            Some(rest) if !base_url.is_empty() && (rest.is_empty() || rest.starts_with('/')) => {
                rest
            }
            _ => path,
        };
        if rest.starts_with('/') {
            rest.to_owned()
        } else {
            format!("/{rest}")
        }
    }

    fn resolve_request(&self, url: &str) -> Result<Arc<Page>, SiteError> {
        let Some(rest) = url.strip_prefix(PLUGIN_PREFIX) else {
            return self.page(url);
        };

        let (name, rest) = rest.split_once('/').unwrap_or((rest, ""));
        let page = self
            .extensions()
            .get(name)
            .and_then(|ext| ext.url(self, rest))
            .ok_or_else(|| SiteError::NotFound(url.to_owned()))?;
        Ok(Arc::new(self.process_virtual(page)))
    }

    fn not_found(&self, url: &str) -> Result<Response, SiteError> {
        tracing::info!(url, "page not found");

        let mut page = match self.page(NOT_FOUND_URL) {
            Ok(page) => Some(Page::clone(&page)),
            Err(e) if e.is_not_found() => None,
            Err(e) => return Err(e),
        };
        for ext in self.extensions().iter() {
            ext.page_not_found(&mut page);
        }
        let page = page.unwrap_or_else(|| self.process_virtual(builtin_not_found(url)));

        let mut extra = Map::new();
        extra.insert("status".to_owned(), Value::from(404));
        Ok(Response {
            status: 404,
            body: self.render(&page, extra)?,
            location: None,
        })
    }
}

fn builtin_not_found(url: &str) -> Page {
    VirtualPage::new(url)
        .title("Not Found")
        .robots("noindex")
        .flag(FLAG_NO_MARKDOWN)
        .content(format!(
            "<p>The requested URL {} was not found.</p>",
            escape_html(url)
        ))
        .build()
}
