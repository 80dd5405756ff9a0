//! Extension points.
//!
//! An [`Extension`] overrides the hooks it cares about; every hook has a
//! no-op default. Hooks run on each active extension in load order and
//! receive mutable access to the in-flight value. A hook can change that
//! value but cannot abort the pipeline.

use serde_json::{Map, Value};

use crate::{Directory, Page, Site};

/// A site extension.
pub trait Extension: Send + Sync {
    /// Name used in `[extensions] enabled` and in `/plugin/<name>/` URLs.
    fn name(&self) -> &str;

    /// Register extra header fields and their defaults.
    ///
    /// Called once when the site is created.
    fn header_defaults(&self, _defaults: &mut Map<String, Value>) {}

    /// Adjust a page after its header block has been parsed.
    fn after_header(&self, _page: &mut Page) {}

    /// Rewrite the raw body (in `page.content`) before placeholders and Markdown.
    fn before_content(&self, _page: &mut Page) {}

    /// Rewrite the rendered body.
    fn after_content(&self, _page: &mut Page) {}

    /// Adjust a freshly scanned directory listing before it is cached.
    fn directory_complete(&self, _directory: &mut Directory) {}

    /// Reorder a listing for a custom `sort` criterion.
    fn directory_sort(&self, _sort: &str, _pages: &mut Vec<Page>) {}

    /// Adjust template variables or switch the template before rendering.
    fn before_render(&self, _vars: &mut Map<String, Value>, _template: &mut String) {}

    /// Rewrite the rendered output.
    fn after_render(&self, _output: &mut String) {}

    /// Rewrite the request URL before it is resolved.
    fn request_url(&self, _url: &mut String) {}

    /// Replace or provide the page shown for a missing URL.
    fn page_not_found(&self, _page: &mut Option<Page>) {}

    /// Serve `/plugin/<name>/<rest>`. `None` means not found.
    fn url(&self, _site: &Site, _rest: &str) -> Option<Page> {
        None
    }
}

/// Active extensions in load order.
#[derive(Default)]
pub struct Extensions {
    loaded: Vec<Box<dyn Extension>>,
}

impl Extensions {
    /// No extensions.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Activate the extensions named in `enabled`, in that order.
    ///
    /// Names with no matching extension in `available` are logged and skipped.
    #[must_use]
    pub fn activate(available: Vec<Box<dyn Extension>>, enabled: &[String]) -> Self {
        let mut available: Vec<Option<Box<dyn Extension>>> =
            available.into_iter().map(Some).collect();
        let mut extensions = Self::new();

        for name in enabled {
            let found = available
                .iter_mut()
                .find(|slot| slot.as_ref().is_some_and(|ext| ext.name() == name.as_str()))
                .and_then(Option::take);
            match found {
                Some(extension) => {
                    tracing::info!(extension = %name, "extension enabled");
                    extensions.register(extension);
                }
                None => tracing::warn!(extension = %name, "unknown extension, skipping"),
            }
        }

        extensions
    }

    /// Append an extension to the load order.
    pub fn register(&mut self, extension: Box<dyn Extension>) {
        self.loaded.push(extension);
    }

    /// Look up an active extension by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&dyn Extension> {
        self.iter().find(|ext| ext.name() == name)
    }

    /// Active extensions in load order.
    pub fn iter(&self) -> impl Iterator<Item = &dyn Extension> {
        self.loaded.iter().map(|ext| &**ext)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.loaded.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.loaded.is_empty()
    }
}

impl std::fmt::Debug for Extensions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.iter().map(Extension::name)).finish()
    }
}
