//! `quire render` command implementation.

use std::io::Write;

use clap::Args;

use crate::commands::GlobalArgs;
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the render command.
#[derive(Args)]
pub(crate) struct RenderArgs {
    /// Request URL, e.g. `/blog/post?page=2`.
    url: String,
}

impl RenderArgs {
    /// Render one URL: body on stdout, status on stderr.
    pub(crate) fn execute(self, global: &GlobalArgs) -> Result<(), CliError> {
        let output = Output::new();
        let site = global.site()?;

        let response = site.respond(&self.url)?;
        match (response.status, &response.location) {
            (200, _) => output.info(&format!("{} {}", response.status, self.url)),
            (_, Some(location)) => {
                output.warning(&format!("{} {} -> {location}", response.status, self.url));
            }
            _ => output.warning(&format!("{} {}", response.status, self.url)),
        }

        let mut stdout = std::io::stdout().lock();
        stdout.write_all(response.body.as_bytes())?;
        stdout.flush()?;
        Ok(())
    }
}
