//! StarSearch Core Library
//!
//! This library searches the ESO science archive for reduced stellar spectra
//! and downloads the matching files.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`archive`] - TAP queries, search criteria, result rows, ESO login
//! - [`download`] - Streaming dataset downloads from the data portal
//! - [`spectra`] - The [`StarSearch`] client combining both
//! - [`targets`] - Target list files and planet designations
//! - [`http_client`] - Shared HTTP client construction

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod archive;
pub mod download;
pub mod http_client;
pub mod spectra;
pub mod targets;
mod user_agent;

// Re-export commonly used types
pub use archive::{Archive, ArchiveError, DateRange, SearchCriteria, SpectrumRecord, TapArchive};
pub use download::{DownloadClient, DownloadError, DownloadOutcome, DownloadReport};
pub use http_client::{HttpTimeouts, build_http_client};
pub use spectra::{
    ArchiveConfig, ConnectError, InstrumentDownload, SpectrumDates, StarSearch, TargetResult,
};
pub use targets::{TargetListError, read_target_list, strip_planet_suffix};
pub use user_agent::default_user_agent;
