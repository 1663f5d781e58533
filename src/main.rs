//! CLI entry point for starsearch.

use std::process::ExitCode;

mod app;
mod app_config;
mod cli;
mod commands;
mod output;

/// How the process ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ProcessExit {
    /// Everything requested succeeded.
    Success,
    /// Some targets or files failed, others succeeded.
    Partial,
    /// Nothing succeeded.
    Failure,
}

impl From<ProcessExit> for ExitCode {
    fn from(exit: ProcessExit) -> Self {
        match exit {
            ProcessExit::Success => ExitCode::SUCCESS,
            ProcessExit::Failure => ExitCode::from(1),
            ProcessExit::Partial => ExitCode::from(2),
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    match app::run().await {
        Ok(exit) => exit.into(),
        Err(error) => {
            eprintln!("Error: {error:#}");
            ProcessExit::Failure.into()
        }
    }
}
