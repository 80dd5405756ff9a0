//! Quire CLI - flat-file content renderer.
//!
//! Provides commands for:
//! - `render`: Render one URL to stdout
//! - `build`: Render every page to static HTML files
//! - `cache purge`: Delete the cache directory

mod commands;
mod error;
mod output;

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{BuildArgs, CacheCommand, GlobalArgs, RenderArgs};
use output::Output;

/// Quire - flat-file content renderer.
#[derive(Parser)]
#[command(name = "quire", version, about)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a URL and write the body to stdout.
    Render(RenderArgs),
    /// Render every page to static HTML.
    Build(BuildArgs),
    /// Cache maintenance commands.
    #[command(subcommand)]
    Cache(CacheCommand),
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let output = Output::new();

    // --verbose enables INFO level, otherwise use RUST_LOG or default to WARN
    let filter = if cli.global.verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Render(args) => args.execute(&cli.global),
        Commands::Build(args) => args.execute(&cli.global),
        Commands::Cache(cmd) => cmd.execute(&cli.global),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            output.error(&format!("Error: {err}"));
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "quire",
            "render",
            "/blog/",
            "--no-cache",
            "--cache-mode",
            "debug",
        ])
        .unwrap();
        assert!(matches!(cli.command, Commands::Render(_)));
    }

    #[test]
    fn test_invalid_cache_mode_rejected() {
        assert!(Cli::try_parse_from(["quire", "--cache-mode", "never", "cache", "purge"]).is_err());
    }
}
