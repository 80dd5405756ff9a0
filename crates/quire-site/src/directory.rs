//! Directory listings.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::{Extensions, Page};

/// Built-in sort criterion: case-sensitive compare on the escaped title.
pub const SORT_ALPHA: &str = "alpha";

/// A listing of the pages in one content directory.
///
/// Pages hold header fields only; `content` is always `None`. The list is
/// kept in scan order and sorted on read with [`Directory::sort`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Directory {
    /// Directory path, `None` for virtual directories.
    pub file: Option<PathBuf>,
    /// Directory URL with trailing slash.
    pub url: String,
    pub pages: Vec<Page>,
}

impl Directory {
    /// In-memory listing for a URL with no backing directory.
    #[must_use]
    pub fn new_virtual(url: impl Into<String>, pages: Vec<Page>) -> Self {
        Self {
            file: None,
            url: url.into(),
            pages,
        }
    }

    #[must_use]
    pub fn is_virtual(&self) -> bool {
        self.file.is_none()
    }

    /// Return the pages ordered by `sort` and `order`.
    ///
    /// The stored listing is left untouched.
    #[must_use]
    pub fn sort(&self, sort: &str, order: SortOrder, extensions: &Extensions) -> Vec<Page> {
        let mut pages = self.pages.clone();
        sort_pages(&mut pages, sort, order, extensions);
        pages
    }
}

/// Listing order.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    /// Parse `"asc"` or `"desc"`, ignoring case.
    #[must_use]
    pub fn parse(order: &str) -> Option<Self> {
        match order.to_ascii_lowercase().as_str() {
            "asc" => Some(Self::Asc),
            "desc" => Some(Self::Desc),
            _ => None,
        }
    }
}

/// Sort `pages` in place.
///
/// `alpha` is applied first, then every extension's `directory_sort` hook,
/// and `Desc` reverses the result. Unknown criteria keep scan order unless an
/// extension handles them. Ties keep their previous relative order.
pub fn sort_pages(pages: &mut Vec<Page>, sort: &str, order: SortOrder, extensions: &Extensions) {
    if sort == SORT_ALPHA {
        pages.sort_by(|a, b| a.title.cmp(&b.title));
    }
    for ext in extensions.iter() {
        ext.directory_sort(sort, pages);
    }
    if order == SortOrder::Desc {
        pages.reverse();
    }
}
