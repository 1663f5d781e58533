//! CLI application wiring: settings, dispatch, progress and exit codes.

mod context;
mod exit_handler;
mod progress;
mod runtime;
mod terminal;

pub(crate) use context::RunContext;
pub(crate) use exit_handler::Tally;
pub(crate) use progress::DownloadProgress;
pub(crate) use runtime::{connect, run};
