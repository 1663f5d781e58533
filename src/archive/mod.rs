//! ESO science archive access.
//!
//! This module turns [`SearchCriteria`] into ADQL, runs it against the ESO
//! TAP service, and parses the result tables into [`SpectrumRecord`]s.
//!
//! # Architecture
//!
//! - [`Archive`] - Async trait for the query side of an archive
//! - [`TapArchive`] - TAP implementation talking to `archive.eso.org`
//! - [`SearchCriteria`] / [`DateRange`] - Filters of a single-target search
//! - [`Credentials`] / [`fetch_token`] - Optional ESO single sign-on
//!
//! # Example
//!
//! ```no_run
//! use starsearch_core::archive::{Archive, SearchCriteria, TapArchive, DEFAULT_TAP_URL};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let tap = TapArchive::new(reqwest::Client::new(), DEFAULT_TAP_URL);
//! let criteria = SearchCriteria::for_target("HD 10700").with_instrument("HARPS");
//! for record in tap.search_spectra(&criteria).await? {
//!     println!("{} {} SNR={:?}", record.dataset_id, record.date_obs(), record.snr);
//! }
//! # Ok(())
//! # }
//! ```

pub mod adql;
mod auth;
mod criteria;
mod error;
pub mod mjd;
mod record;
mod tap;

pub use auth::{Credentials, DEFAULT_TOKEN_URL, KEYRING_SERVICE, PASSWORD_ENV_VAR, fetch_token};
pub use criteria::{
    DEFAULT_INSTRUMENTS, DEFAULT_MIN_SNR, DEFAULT_SINCE, DateRange, SearchCriteria,
    default_since, normalize_instrument, suggest_instrument,
};
pub use error::ArchiveError;
pub use record::{SPECTRUM_COLUMNS, SpectrumRecord, parse_count_table, parse_spectrum_table};
pub use tap::{DEFAULT_TAP_URL, TapArchive};

use std::collections::BTreeMap;

use async_trait::async_trait;

/// Query side of the ESO archive.
///
/// Results are re-checked against the criteria by
/// [`StarSearch`](crate::StarSearch), so a lenient backend cannot leak rows.
#[async_trait]
pub trait Archive: Send + Sync {
    /// Reduced spectra matching `criteria`, ordered by observation start.
    async fn search_spectra(
        &self,
        criteria: &SearchCriteria,
    ) -> Result<Vec<SpectrumRecord>, ArchiveError>;

    /// Number of raw observations of `target`, per instrument.
    async fn instrument_counts(&self, target: &str) -> Result<BTreeMap<String, usize>, ArchiveError>;
}
