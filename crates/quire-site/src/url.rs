//! Mapping between site URLs and content files.
//!
//! - `/` → `index.md`, `/guide/` → `guide/index.md`
//! - `/guide/setup` → `guide/setup.md`
//!
//! URLs containing `..` segments never map to a file.

use std::path::{Component, Path, PathBuf};

/// Name of the file representing a directory.
pub const INDEX_FILE: &str = "index.md";

/// Map a site URL to the source file under `content_dir`.
///
/// Returns `None` for URLs that would escape the content directory.
#[must_use]
pub fn url_to_file(content_dir: &Path, url: &str) -> Option<PathBuf> {
    let mut segments = segments(url)?;
    let mut file = content_dir.to_path_buf();
    if url.is_empty() || url.ends_with('/') || segments.is_empty() {
        file.extend(segments);
        file.push(INDEX_FILE);
    } else {
        let last = segments.pop()?;
        file.extend(segments);
        file.push(format!("{last}.md"));
    }
    Some(file)
}

/// Map a site URL to the directory listing it belongs to.
///
/// A trailing slash names the directory itself, otherwise the last segment is
/// dropped: `/blog/post` lists `blog/`.
#[must_use]
pub fn url_to_dir(content_dir: &Path, url: &str) -> Option<PathBuf> {
    let mut segments = segments(url)?;
    if !url.ends_with('/') {
        segments.pop();
    }
    let mut dir = content_dir.to_path_buf();
    dir.extend(segments);
    Some(dir)
}

/// Map a source file under `content_dir` back to its URL.
#[must_use]
pub fn file_to_url(content_dir: &Path, file: &Path) -> Option<String> {
    let mut parts = relative_parts(content_dir, file)?;
    let name = parts.pop()?;
    if name == INDEX_FILE {
        return Some(join_dir_url(&parts));
    }
    let stem = name.strip_suffix(".md")?;
    parts.push(stem.to_owned());
    Some(format!("/{}", parts.join("/")))
}

/// Map a directory under `content_dir` to its URL, always with a trailing slash.
#[must_use]
pub fn dir_to_url(content_dir: &Path, dir: &Path) -> Option<String> {
    relative_parts(content_dir, dir).map(|parts| join_dir_url(&parts))
}

/// Resolve `url` against the directory URL of the page that references it.
pub(crate) fn resolve_relative(base_dir_url: &str, url: &str) -> String {
    if url.starts_with('/') {
        return url.to_owned();
    }
    if base_dir_url.ends_with('/') {
        format!("{base_dir_url}{url}")
    } else {
        format!("{base_dir_url}/{url}")
    }
}

fn segments(url: &str) -> Option<Vec<&str>> {
    let segments: Vec<&str> = url
        .split('/')
        .filter(|s| !s.is_empty() && *s != ".")
        .collect();
    if segments.iter().any(|s| *s == ".." || s.contains('\\')) {
        return None;
    }
    Some(segments)
}

fn relative_parts(content_dir: &Path, path: &Path) -> Option<Vec<String>> {
    path.strip_prefix(content_dir)
        .ok()?
        .components()
        .map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect()
}

fn join_dir_url(parts: &[String]) -> String {
    if parts.is_empty() {
        "/".to_owned()
    } else {
        format!("/{}/", parts.join("/"))
    }
}
