use std::io::{self, IsTerminal};

use anyhow::{Context, Result};
use clap::Parser;
use starsearch_core::StarSearch;
use tracing::debug;

use crate::app::{RunContext, terminal};
use crate::app_config::load_default_file_config;
use crate::cli::{Cli, Command};
use crate::{ProcessExit, commands};

pub(crate) async fn run() -> Result<ProcessExit> {
    // Usage errors exit 1 so that 2 always means partial success.
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(error) => {
            let _ = error.print();
            return Ok(if error.use_stderr() {
                ProcessExit::Failure
            } else {
                ProcessExit::Success
            });
        }
    };

    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    let default_level = terminal::resolve_default_log_level(cli.verbose, cli.quiet);
    terminal::init_tracing(default_level, terminal::no_color_env_requested());
    debug!(?cli, "CLI arguments parsed");

    let loaded = load_default_file_config()?;
    if loaded.loaded_from_file
        && let Some(path) = &loaded.path
    {
        debug!(path = %path.display(), "loaded config file");
    }

    let show_progress = terminal::should_use_progress_bar(
        io::stderr().is_terminal(),
        cli.quiet,
        terminal::is_dumb_terminal(),
    );
    let ctx = RunContext::resolve(&cli, loaded.config.as_ref(), show_progress);

    match &cli.command {
        Command::Instruments(args) => commands::run_instruments_command(&ctx, args).await,
        Command::Spectra(args) => commands::run_spectra_command(&ctx, args).await,
        Command::Dates(args) => commands::run_dates_command(&ctx, args).await,
        Command::Search(args) => commands::run_search_command(&ctx, args).await,
        Command::Download(args) => commands::run_download_command(&ctx, args).await,
        Command::List(args) => commands::run_list_command(&ctx, args).await,
        Command::Config => {
            commands::run_config_show_command(&ctx, &loaded);
            Ok(ProcessExit::Success)
        }
    }
}

/// Opens an archive session, logging in when a user is configured.
pub(crate) async fn connect(ctx: &RunContext) -> Result<StarSearch> {
    StarSearch::connect(&ctx.archive, ctx.user.as_deref())
        .await
        .context("Failed to connect to the ESO archive")
}
