//! `quire build` command implementation.
//!
//! Renders every page under the content directory to
//! `<out>/<url>/index.html`. Pages are rendered in parallel on the rayon
//! pool; all workers share one `Site` and its cache directory.

use std::fs;
use std::path::{Path, PathBuf};

use clap::Args;
use quire_site::Site;
use rayon::prelude::*;

use crate::commands::GlobalArgs;
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the build command.
#[derive(Args)]
pub(crate) struct BuildArgs {
    /// Output directory for the rendered site.
    #[arg(short, long, default_value = "public")]
    out: PathBuf,
}

impl BuildArgs {
    pub(crate) fn execute(self, global: &GlobalArgs) -> Result<(), CliError> {
        let output = Output::new();
        let site = global.site()?;

        output.info(&format!("Content: {}", site.content_dir().display()));
        output.info(&format!("Output: {}", self.out.display()));

        let files = site.source_files();
        let failures: Vec<String> = files
            .par_iter()
            .filter_map(|file| {
                build_page(&site, file, &self.out)
                    .err()
                    .map(|e| format!("{}: {e}", file.display()))
            })
            .collect();

        for failure in &failures {
            output.error(failure);
        }
        if !failures.is_empty() {
            return Err(CliError::Build(format!(
                "{} of {} pages failed to build",
                failures.len(),
                files.len()
            )));
        }

        output.success(&format!("Built {} pages", files.len()));
        Ok(())
    }
}

/// Render one source file and write it under `out`.
fn build_page(site: &Site, file: &Path, out: &Path) -> Result<PathBuf, CliError> {
    let page = site.page_from_file(file)?;
    let html = site.render(&page, serde_json::Map::new())?;

    let target = output_path(out, &page.url);
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&target, html)?;
    tracing::debug!(url = %page.url, target = %target.display(), "page written");
    Ok(target)
}

/// `/` maps to `out/index.html`, `/blog/post` to `out/blog/post/index.html`.
fn output_path(out: &Path, url: &str) -> PathBuf {
    let mut path = out.to_path_buf();
    path.extend(url.split('/').filter(|s| !s.is_empty()));
    path.push("index.html");
    path
}
