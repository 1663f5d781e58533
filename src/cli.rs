//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use starsearch_core::archive::mjd::parse_date;

/// Search and download stellar spectra from the ESO science archive.
///
/// Searches default to the FEROS, UVES, HARPS and ESPRESSO instruments,
/// observations since 1990-01-23 and a minimum SNR of 30.
#[derive(Parser, Debug)]
#[command(name = "starsearch")]
#[command(author, version, about)]
pub struct Cli {
    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// ESO user to log in as (password from STARSEARCH_PASSWORD or the keyring)
    #[arg(short, long, global = true)]
    pub user: Option<String>,

    /// ESO TAP service root
    #[arg(long, global = true, value_name = "URL")]
    pub tap_url: Option<String>,

    /// ESO data portal file endpoint
    #[arg(long, global = true, value_name = "URL")]
    pub data_url: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List the instruments that observed a star, with raw observation counts
    Instruments(StarArgs),
    /// Count downloadable spectra per instrument
    Spectra(InstrumentArgs),
    /// List observation dates (MJD) of a star's spectra
    Dates(InstrumentArgs),
    /// Search a star's spectra
    Search(SearchArgs),
    /// Search and download the spectra of one or more stars
    Download(DownloadArgs),
    /// Search every star of a tab-separated target list
    List(ListArgs),
    /// Show the effective configuration
    Config,
}

#[derive(Args, Debug, Clone)]
pub struct StarArgs {
    /// Target name as known to the archive (e.g. "HD 10700")
    pub star: String,
}

#[derive(Args, Debug, Clone)]
pub struct InstrumentArgs {
    /// Target name as known to the archive
    pub star: String,

    /// Restrict to one instrument
    #[arg(short, long)]
    pub instrument: Option<String>,
}

/// Filters shared by the searching subcommands.
#[derive(Args, Debug, Clone, Default)]
pub struct FilterArgs {
    /// Instruments to search (repeat or comma-separate; default: config or FEROS,UVES,HARPS,ESPRESSO)
    #[arg(short, long, value_delimiter = ',')]
    pub instrument: Vec<String>,

    /// Earliest observation date, inclusive (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date_arg, conflicts_with = "all_dates")]
    pub since: Option<NaiveDate>,

    /// Latest observation date, inclusive (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date_arg)]
    pub until: Option<NaiveDate>,

    /// Minimum signal-to-noise ratio
    #[arg(long, value_parser = parse_snr_arg, conflicts_with = "any_snr")]
    pub min_snr: Option<f64>,

    /// Drop the default earliest-date filter
    #[arg(long)]
    pub all_dates: bool,

    /// Drop the SNR filter
    #[arg(long)]
    pub any_snr: bool,
}

#[derive(Args, Debug, Clone)]
pub struct SearchArgs {
    /// Target name as known to the archive
    pub star: String,

    #[command(flatten)]
    pub filters: FilterArgs,

    /// Print results as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct DownloadArgs {
    /// Target names
    #[arg(required = true)]
    pub stars: Vec<String>,

    #[command(flatten)]
    pub filters: FilterArgs,

    /// Directory for downloaded files (default: config or current directory)
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Fetch files again even if they already exist
    #[arg(long)]
    pub overwrite: bool,
}

#[derive(Args, Debug, Clone)]
pub struct ListArgs {
    /// Tab-separated target list; names are read from the first column after one header line
    pub file: PathBuf,

    #[command(flatten)]
    pub filters: FilterArgs,

    /// Download the spectra found for each target
    #[arg(short, long)]
    pub download: bool,

    /// Directory for downloaded files (default: config or current directory)
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Fetch files again even if they already exist
    #[arg(long)]
    pub overwrite: bool,
}

fn parse_date_arg(value: &str) -> Result<NaiveDate, String> {
    parse_date(value).map_err(|e| e.to_string())
}

fn parse_snr_arg(value: &str) -> Result<f64, String> {
    let snr: f64 = value
        .trim()
        .parse()
        .map_err(|_| format!("'{value}' is not a number"))?;
    if !snr.is_finite() || snr < 0.0 {
        return Err(format!("SNR must be a non-negative number, got {value}"));
    }
    Ok(snr)
}
