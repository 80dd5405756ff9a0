//! `quire cache` commands.

use clap::Subcommand;

use crate::commands::GlobalArgs;
use crate::error::CliError;
use crate::output::Output;

/// Cache maintenance.
#[derive(Subcommand)]
pub(crate) enum CacheCommand {
    /// Delete the whole cache directory.
    Purge,
}

impl CacheCommand {
    pub(crate) fn execute(self, global: &GlobalArgs) -> Result<(), CliError> {
        let output = Output::new();
        let config = global.load_config()?;
        let dir = &config.cache_resolved.dir;

        match self {
            Self::Purge => {
                quire_cache::purge_all(dir);
                output.success(&format!("Purged cache at {}", dir.display()));
            }
        }
        Ok(())
    }
}
