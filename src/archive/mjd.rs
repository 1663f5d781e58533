//! Calendar date and Modified Julian Date conversions.
//!
//! The archive stores observation start times as MJD (`t_min`), while users
//! think in calendar dates. All conversions are UTC at day granularity.

use chrono::{Duration, NaiveDate, NaiveDateTime};

use super::ArchiveError;

/// MJD 0 is 1858-11-17T00:00 UTC.
const MJD_EPOCH: (i32, u32, u32) = (1858, 11, 17);

const MILLIS_PER_DAY: f64 = 86_400_000.0;

fn mjd_epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(MJD_EPOCH.0, MJD_EPOCH.1, MJD_EPOCH.2).unwrap_or_default()
}

/// Parses a `YYYY-MM-DD` date.
///
/// # Errors
///
/// Returns [`ArchiveError::InvalidCriteria`] when the string is not a valid date.
pub fn parse_date(value: &str) -> Result<NaiveDate, ArchiveError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|e| {
        ArchiveError::invalid_criteria(format!("'{value}' is not a YYYY-MM-DD date: {e}"))
    })
}

/// MJD at 00:00 UTC of `date`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn date_to_mjd(date: NaiveDate) -> f64 {
    (date - mjd_epoch()).num_days() as f64
}

/// Calendar timestamp (UTC) for an MJD value, rounded to the millisecond.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn mjd_to_datetime(mjd: f64) -> NaiveDateTime {
    let millis = (mjd * MILLIS_PER_DAY).round() as i64;
    mjd_epoch().and_hms_opt(0, 0, 0).unwrap_or_default() + Duration::milliseconds(millis)
}

/// ISO-8601 rendering of an MJD value (`YYYY-MM-DDTHH:MM:SS`).
#[must_use]
pub fn format_mjd(mjd: f64) -> String {
    mjd_to_datetime(mjd).format("%Y-%m-%dT%H:%M:%S").to_string()
}
