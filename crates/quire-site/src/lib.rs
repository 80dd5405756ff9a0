//! Page and directory resolution, extensions and rendering for Quire.
//!
//! This crate provides:
//! - [`Site`]: the context object resolving URLs to pages and listings
//! - [`Page`], [`VirtualPage`] and [`Directory`]: resolved entities
//! - [`Extension`]: typed hooks into every pipeline stage
//! - [`Response`]: dispatch of a request URL to a rendered page
//!
//! # Quick Start
//!
//! ```no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use quire_config::Config;
//! use quire_site::{Extensions, Site};
//!
//! let config = Config::load(None, None)?;
//! let site = Site::new(config, Extensions::new());
//!
//! let page = site.page("/guide/setup")?;
//! let html = site.render(&page, serde_json::Map::new())?;
//!
//! let response = site.respond("/guide/setup?x=1")?;
//! assert_eq!(response.status, 200);
//! # Ok(())
//! # }
//! ```

mod directory;
mod dispatch;
mod error;
mod extension;
mod header;
mod markdown;
mod page;
mod renderer;
mod site;
mod url;

pub use directory::{Directory, SORT_ALPHA, SortOrder, sort_pages};
pub use dispatch::Response;
pub use error::SiteError;
pub use extension::{Extension, Extensions};
pub use page::{
    DEFAULT_TEMPLATE, FLAG_NO_CACHE, FLAG_NO_DIRECTORY, FLAG_NO_MARKDOWN, FLAG_NO_THEME, Page,
    VirtualPage,
};
pub use site::Site;
pub use url::{INDEX_FILE, dir_to_url, file_to_url, url_to_dir, url_to_file};
