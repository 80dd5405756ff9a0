//! CLI command implementations.

pub(crate) mod build;
pub(crate) mod cache;
pub(crate) mod render;

use std::path::PathBuf;

use clap::Args;
use quire_cache::CacheMode;
use quire_config::{CliSettings, Config};
use quire_site::{Extensions, Site};

use crate::error::CliError;

pub(crate) use build::BuildArgs;
pub(crate) use cache::CacheCommand;
pub(crate) use render::RenderArgs;

/// Options shared by every command.
#[derive(Args, Debug)]
pub(crate) struct GlobalArgs {
    /// Path to configuration file (default: auto-discover quire.toml).
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Content directory (overrides config).
    #[arg(long, global = true, env = "QUIRE_CONTENT_DIR")]
    content_dir: Option<PathBuf>,

    /// URL prefix the site is served under (overrides config).
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Disable caching.
    #[arg(long, global = true)]
    no_cache: bool,

    /// Cache mode: normal, debug or purge (overrides config).
    #[arg(long, global = true, value_parser = parse_cache_mode)]
    cache_mode: Option<CacheMode>,

    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

impl GlobalArgs {
    /// Load the configuration with command-line overrides applied.
    pub(crate) fn load_config(&self) -> Result<Config, CliError> {
        let settings = CliSettings {
            content_dir: self.content_dir.clone(),
            cache_enabled: self.no_cache.then_some(false),
            cache_mode: self.cache_mode,
            base_url: self.base_url.clone(),
        };
        Ok(Config::load(self.config.as_deref(), Some(&settings))?)
    }

    /// Load the configuration and create the site.
    ///
    /// The binary ships no extensions of its own; names listed under
    /// `[extensions] enabled` are reported and skipped.
    pub(crate) fn site(&self) -> Result<Site, CliError> {
        let config = self.load_config()?;
        let extensions = Extensions::activate(Vec::new(), &config.extensions.enabled);
        Ok(Site::new(config, extensions))
    }
}

fn parse_cache_mode(value: &str) -> Result<CacheMode, String> {
    CacheMode::parse(value).ok_or_else(|| format!("expected normal, debug or purge, got `{value}`"))
}
