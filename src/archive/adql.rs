//! ADQL query construction for the ESO TAP service.

use std::fmt::Write as _;

use super::criteria::SearchCriteria;
use super::record::SPECTRUM_COLUMNS;

/// Table of reduced data products.
const OBSCORE_TABLE: &str = "ivoa.ObsCore";

/// Table of raw frames, used to count observations per instrument.
const RAW_TABLE: &str = "dbo.raw";

/// Quotes a string literal for ADQL (`O'Brien` → `'O''Brien'`).
#[must_use]
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Builds the spectrum search query for `criteria`.
///
/// Every filter in the criteria becomes a `WHERE` clause so the archive does
/// the heavy lifting; results are ordered by observation start.
#[must_use]
pub fn spectra_query(criteria: &SearchCriteria) -> String {
    let mut query = format!(
        "SELECT {} FROM {OBSCORE_TABLE} WHERE dataproduct_type = 'spectrum' AND target_name = {}",
        SPECTRUM_COLUMNS.join(", "),
        quote_literal(criteria.target.trim()),
    );

    let instruments: Vec<String> = criteria
        .instruments
        .iter()
        .map(String::as_str)
        .map(quote_literal)
        .collect();
    if let [single] = instruments.as_slice() {
        let _ = write!(query, " AND instrument_name = {single}");
    } else {
        let _ = write!(query, " AND instrument_name IN ({})", instruments.join(", "));
    }

    if let Some(start) = criteria.dates.start_mjd() {
        let _ = write!(query, " AND t_min >= {start:.1}");
    }
    if let Some(end) = criteria.dates.end_mjd() {
        let _ = write!(query, " AND t_min < {end:.1}");
    }
    if let Some(snr) = criteria.min_snr {
        let _ = write!(query, " AND snr >= {snr}");
    }

    query.push_str(" ORDER BY t_min");
    query
}

/// Builds the per-instrument raw observation count query for `target`.
#[must_use]
pub fn instrument_count_query(target: &str) -> String {
    format!(
        "SELECT instrument, COUNT(*) AS n FROM {RAW_TABLE} WHERE target = {} GROUP BY instrument ORDER BY instrument",
        quote_literal(target.trim())
    )
}
