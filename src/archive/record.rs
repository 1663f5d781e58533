//! Result rows returned by archive searches.

use serde::{Deserialize, Serialize};

use super::ArchiveError;
use super::mjd::format_mjd;

/// Columns selected from `ivoa.ObsCore`, in query order.
pub const SPECTRUM_COLUMNS: [&str; 10] = [
    "dp_id",
    "target_name",
    "instrument_name",
    "t_min",
    "snr",
    "obs_release_date",
    "s_ra",
    "s_dec",
    "obs_collection",
    "access_url",
];

/// One reduced (phase 3) spectrum in the ESO archive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpectrumRecord {
    /// Archive dataset identifier (`ADP.2014-09-16T11:03:30.727`).
    #[serde(rename = "dp_id")]
    pub dataset_id: String,
    /// Target name as recorded by the observer.
    #[serde(rename = "target_name", default)]
    pub target: String,
    /// Instrument that produced the observation.
    #[serde(rename = "instrument_name", default)]
    pub instrument: String,
    /// Observation start, Modified Julian Date.
    #[serde(rename = "t_min")]
    pub mjd_obs: f64,
    /// Signal-to-noise ratio of the spectrum.
    #[serde(default)]
    pub snr: Option<f64>,
    /// Public release date (ISO timestamp).
    #[serde(rename = "obs_release_date", default)]
    pub release_date: Option<String>,
    /// Right ascension, degrees.
    #[serde(rename = "s_ra", default)]
    pub ra: Option<f64>,
    /// Declination, degrees.
    #[serde(rename = "s_dec", default)]
    pub dec: Option<f64>,
    /// Phase 3 collection the product belongs to.
    #[serde(rename = "obs_collection", default)]
    pub collection: Option<String>,
    /// Direct access URL advertised by the archive.
    #[serde(rename = "access_url", default)]
    pub access_url: Option<String>,
}

impl SpectrumRecord {
    /// Observation start as an ISO timestamp.
    #[must_use]
    pub fn date_obs(&self) -> String {
        format_mjd(self.mjd_obs)
    }
}

/// Parses a TAP CSV result table into spectrum records.
///
/// `source_url` is only used for error context.
///
/// # Errors
///
/// Returns [`ArchiveError::MalformedTable`] when the header lacks a required
/// column or a row cannot be decoded.
pub fn parse_spectrum_table(body: &str, source_url: &str) -> Result<Vec<SpectrumRecord>, ArchiveError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(body.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| ArchiveError::malformed_table(source_url, e.to_string()))?
        .clone();
    for required in ["dp_id", "t_min"] {
        if !headers.iter().any(|h| h == required) {
            return Err(ArchiveError::malformed_table(
                source_url,
                format!("missing column '{required}'"),
            ));
        }
    }

    reader
        .deserialize::<SpectrumRecord>()
        .enumerate()
        .map(|(index, row)| {
            row.map_err(|e| {
                ArchiveError::malformed_table(source_url, format!("row {}: {e}", index + 1))
            })
        })
        .collect()
}

/// Parses a two-column `instrument,count` table.
///
/// # Errors
///
/// Returns [`ArchiveError::MalformedTable`] when a row is not `name,integer`.
pub fn parse_count_table(body: &str, source_url: &str) -> Result<Vec<(String, usize)>, ArchiveError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(body.as_bytes());

    let mut counts = Vec::new();
    for (index, row) in reader.records().enumerate() {
        let row = row.map_err(|e| ArchiveError::malformed_table(source_url, e.to_string()))?;
        let (Some(name), Some(count)) = (row.get(0), row.get(1)) else {
            return Err(ArchiveError::malformed_table(
                source_url,
                format!("row {}: expected 2 columns", index + 1),
            ));
        };
        let count = count.parse::<usize>().map_err(|e| {
            ArchiveError::malformed_table(source_url, format!("row {}: bad count: {e}", index + 1))
        })?;
        if !name.is_empty() {
            counts.push((name.to_string(), count));
        }
    }
    Ok(counts)
}

#[cfg(test)]
mod tests {
    use super::*;

    const URL: &str = "https://archive.eso.org/tap_obs/sync";

    #[test]
    fn test_parse_spectrum_table_reads_rows() {
        let body = "dp_id,target_name,instrument_name,t_min,snr,obs_release_date,s_ra,s_dec,obs_collection,access_url\n\
ADP.2014-09-16T11:03:30.727,HD 10700,HARPS,53272.0871,143.2,2004-10-01T00:00:00Z,26.017,-15.937,HARPS,https://archive.eso.org/datalink/links?ID=ivo://eso.org/ID?ADP.2014-09-16T11:03:30.727\n\
ADP.2016-01-01T00:00:00.001,HD 10700,UVES,55000.5,,,,,UVES,\n";
        let records = parse_spectrum_table(body, URL).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].dataset_id, "ADP.2014-09-16T11:03:30.727");
        assert_eq!(records[0].instrument, "HARPS");
        assert_eq!(records[0].snr, Some(143.2));
        assert_eq!(records[1].snr, None);
        assert_eq!(records[1].release_date, None);
        assert_eq!(records[1].date_obs(), "2009-06-18T12:00:00");
    }

    #[test]
    fn test_parse_spectrum_table_accepts_reordered_columns() {
        let body = "t_min,dp_id,instrument_name\n51544.0,ADP.X,FEROS\n";
        let records = parse_spectrum_table(body, URL).unwrap();
        assert_eq!(records[0].dataset_id, "ADP.X");
        assert_eq!(records[0].instrument, "FEROS");
        assert!(records[0].target.is_empty());
    }

    #[test]
    fn test_parse_spectrum_table_empty_result() {
        let body = SPECTRUM_COLUMNS.join(",") + "\n";
        assert!(parse_spectrum_table(&body, URL).unwrap().is_empty());
    }

    #[test]
    fn test_parse_spectrum_table_missing_column() {
        let err = parse_spectrum_table("target_name,snr\nHD 1,10\n", URL).unwrap_err();
        assert!(err.to_string().contains("dp_id"), "{err}");
    }

    #[test]
    fn test_parse_spectrum_table_bad_number() {
        let err = parse_spectrum_table("dp_id,t_min\nADP.X,yesterday\n", URL).unwrap_err();
        assert!(matches!(err, ArchiveError::MalformedTable { .. }));
        assert!(err.to_string().contains("row 1"), "{err}");
    }

    #[test]
    fn test_parse_count_table() {
        let body = "instrument,n\nHARPS,120\nUVES,7\n,3\n";
        let counts = parse_count_table(body, URL).unwrap();
        assert_eq!(
            counts,
            vec![("HARPS".to_string(), 120), ("UVES".to_string(), 7)]
        );
    }

    #[test]
    fn test_parse_count_table_rejects_non_integer() {
        assert!(parse_count_table("instrument,n\nHARPS,many\n", URL).is_err());
    }
}
