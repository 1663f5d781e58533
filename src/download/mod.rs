//! Dataset downloads from the ESO data portal.
//!
//! This module streams archive datasets to disk.
//!
//! # Features
//!
//! - Streaming downloads (memory-efficient for large FITS files)
//! - Deterministic file names derived from dataset ids
//! - Idempotent re-runs: existing files are skipped unless overwriting
//! - `.part` staging so interrupted downloads never look complete
//! - Structured error types with full context
//!
//! # Example
//!
//! ```no_run
//! use starsearch_core::download::{DownloadClient, DEFAULT_DATA_URL};
//! use std::path::Path;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = DownloadClient::new(reqwest::Client::new(), DEFAULT_DATA_URL);
//! let outcome = client
//!     .download_dataset("ADP.2014-09-16T11:03:30.727", Path::new("./spectra"), false)
//!     .await?;
//! println!("Downloaded: {}", outcome.path().display());
//! # Ok(())
//! # }
//! ```

mod batch;
mod client;
mod error;
mod filename;

pub use batch::{BatchProgress, DownloadReport, download_records};
pub use client::{DEFAULT_DATA_URL, DownloadClient, DownloadOutcome};
pub use error::DownloadError;
pub use filename::{DATASET_EXTENSION, dataset_filename};
