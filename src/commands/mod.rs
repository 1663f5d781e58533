//! CLI command handlers.

mod config;
mod download;
mod info;
mod list;
mod search;

pub use config::run_config_show_command;
pub use download::run_download_command;
pub use info::{run_dates_command, run_instruments_command, run_spectra_command};
pub use list::run_list_command;
pub use search::run_search_command;
