//! High-level spectra search and retrieval.
//!
//! [`StarSearch`] combines an [`Archive`](crate::archive::Archive) backend
//! with a [`DownloadClient`](crate::download::DownloadClient):
//!
//! - single-target searches by instrument, date window and SNR
//! - instrument and spectra counts, observation dates
//! - target-list searches with per-target results
//! - search-and-download per instrument
//!
//! # Example
//!
//! ```no_run
//! use starsearch_core::archive::SearchCriteria;
//! use starsearch_core::spectra::{ArchiveConfig, StarSearch};
//! use std::path::Path;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let search = StarSearch::connect(&ArchiveConfig::default(), None).await?;
//! let criteria = SearchCriteria::for_target("HD 10700").with_instrument("HARPS");
//! let records = search.search_star(&criteria).await?;
//! let report = search.download(&records, Path::new("./spectra"), false, |_| {}).await;
//! println!("{} files ready", report.completed());
//! # Ok(())
//! # }
//! ```

mod error;
mod service;

pub use error::ConnectError;
pub use service::{ArchiveConfig, InstrumentDownload, SpectrumDates, StarSearch, TargetResult};
