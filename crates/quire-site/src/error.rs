//! Site error type.

use std::path::PathBuf;

use quire_template::TemplateError;

/// Error returned when resolving or rendering fails.
#[derive(Debug, thiserror::Error)]
pub enum SiteError {
    /// No page, directory or template for the given URL or name.
    #[error("Not found: {0}")]
    NotFound(String),
    /// Source file exists but could not be read.
    #[error("I/O error reading {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Template failed to compile or render.
    #[error(transparent)]
    Template(#[from] TemplateError),
}

impl SiteError {
    /// Map an I/O error on `path`, turning a missing file into `NotFound`.
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::NotFound {
            Self::NotFound(path.display().to_string())
        } else {
            Self::Io { path, source }
        }
    }

    /// Whether this is a [`SiteError::NotFound`].
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}
